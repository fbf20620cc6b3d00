// Test utilities: source images, configuration and request builders

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use resin::config::Config;
use resin::pipeline::RequestContext;
use resin::thumbnail::{MemoryObjectStore, RequestOrchestrator, StaticSourceFetcher};

pub const CAT_SOURCE: &str = "https://img.example.com/cat.jpg";
pub const SECRET: &str = "integration-secret";

/// Encode a solid-colour JPEG of the given size
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([90, 160, 220]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .expect("Failed to encode test JPEG");
    out.into_inner()
}

pub fn config(known_domains: &[&str]) -> Config {
    Config {
        signature_key: SECRET.to_string(),
        known_domains: known_domains.iter().map(|d| d.to_string()).collect(),
        ..Default::default()
    }
}

pub fn publishing_config(known_domains: &[&str], bucket: &str) -> Config {
    let mut config = config(known_domains);
    config.storage.upload_to_s3 = true;
    config.storage.bucket_name = Some(bucket.to_string());
    config
}

/// Fetcher serving a 640x480 cat and a 300x900 portrait
pub fn fetcher() -> Arc<StaticSourceFetcher> {
    Arc::new(
        StaticSourceFetcher::new()
            .with_source(CAT_SOURCE, jpeg_bytes(640, 480), Some("application/octet-stream"))
            .with_source(
                "https://cdn.partner.test/portrait.jpg",
                jpeg_bytes(300, 900),
                Some("image/jpeg"),
            ),
    )
}

pub fn orchestrator(config: Config) -> RequestOrchestrator {
    RequestOrchestrator::new(Arc::new(config), fetcher(), None)
        .expect("Failed to build orchestrator")
}

pub fn publishing_orchestrator(config: Config, store: &MemoryObjectStore) -> RequestOrchestrator {
    RequestOrchestrator::new(Arc::new(config), fetcher(), Some(Arc::new(store.clone())))
        .expect("Failed to build orchestrator")
}

pub fn request(path: &str, query: &[(&str, &str)]) -> RequestContext {
    let query: HashMap<String, String> = query
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    RequestContext::with_query_params("GET".to_string(), path.to_string(), query)
}

pub fn error_body(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).expect("Error body must be JSON")
}
