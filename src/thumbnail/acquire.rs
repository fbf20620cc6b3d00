//! Source image acquisition.
//!
//! Fetches the source bytes and resolves the file extension and MIME type
//! that travel with the image through the rest of the pipeline.
//!
//! # Supported Sources
//!
//! - `https://example.com/image.jpg` / `http://...` - fetched as-is
//! - `example.com/image.jpg` - fetched over HTTPS
//!
//! The fetch is single-attempt: no retries, no internal timeout.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use image::DynamicImage;
use parking_lot::RwLock;

use crate::constants::GENERIC_MIME_TYPE;
use crate::error::ThumbnailError;

/// Raw response of a source fetch
#[derive(Debug, Clone)]
pub struct FetchedSource {
    pub data: Bytes,
    /// Transport-reported Content-Type, if any
    pub content_type: Option<String>,
}

/// Abstraction over the transport used to fetch source images
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, source: &str) -> Result<FetchedSource, ThumbnailError>;
}

/// Pixel payload of an [`ImageAsset`]
#[derive(Clone)]
pub enum ImagePayload {
    /// Bytes exactly as fetched
    Encoded(Bytes),
    /// Decoded (and possibly transformed) pixels
    Decoded(DynamicImage),
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImagePayload::Encoded(data) => f.debug_tuple("Encoded").field(&data.len()).finish(),
            ImagePayload::Decoded(image) => f
                .debug_tuple("Decoded")
                .field(&(image.width(), image.height()))
                .finish(),
        }
    }
}

/// An image plus the format metadata resolved at acquisition time
///
/// `extension` and `mime_type` are fixed when the asset is acquired and are
/// carried unchanged through every transform.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub payload: ImagePayload,
    /// Lower-cased source extension, possibly empty
    pub extension: String,
    pub mime_type: String,
}

impl ImageAsset {
    /// Same metadata, new pixels
    pub fn with_image(&self, image: DynamicImage) -> Self {
        Self {
            payload: ImagePayload::Decoded(image),
            extension: self.extension.clone(),
            mime_type: self.mime_type.clone(),
        }
    }
}

/// Extract the extension of a source path
///
/// Takes the text after the last `.` of the final path segment and keeps its
/// leading alphanumeric run, so `cat.JPG?v=2` yields `jpg`.
pub fn extract_extension(source: &str) -> String {
    let file_name = source.rsplit('/').next().unwrap_or_default();
    let stem = file_name.trim_start_matches('.');

    let Some((_, ext)) = stem.rsplit_once('.') else {
        return String::new();
    };

    ext.chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Resolve the MIME type of an asset
///
/// A specific transport content type always wins. Otherwise known image
/// extensions are mapped, and anything else stays `application/octet-stream`.
pub fn resolve_mime_type(transport: Option<&str>, extension: &str) -> String {
    if let Some(content_type) = transport.filter(|ct| !ct.is_empty()) {
        if content_type != GENERIC_MIME_TYPE {
            return content_type.to_string();
        }
    }

    match extension.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        _ => GENERIC_MIME_TYPE,
    }
    .to_string()
}

/// URL actually requested for a source
pub fn fetch_url(source: &str) -> String {
    if source.starts_with("http://") || source.starts_with("https://") {
        source.to_string()
    } else {
        format!("https://{}", source)
    }
}

/// Fetch a source and build its [`ImageAsset`]
pub async fn acquire(
    fetcher: &dyn SourceFetcher,
    source: &str,
) -> Result<ImageAsset, ThumbnailError> {
    let fetched = fetcher.fetch(source).await?;

    let extension = extract_extension(source);
    let mime_type = resolve_mime_type(fetched.content_type.as_deref(), &extension);

    tracing::debug!(
        source = %source,
        bytes = fetched.data.len(),
        extension = %extension,
        mime_type = %mime_type,
        "Source image acquired"
    );

    Ok(ImageAsset {
        payload: ImagePayload::Encoded(fetched.data),
        extension,
        mime_type,
    })
}

/// Fetches sources over HTTP(S) with reqwest, streaming the body
#[derive(Clone)]
pub struct HttpSourceFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpSourceFetcher {
    /// # Errors
    ///
    /// Returns `Configuration` if the HTTP client cannot be created
    /// (e.g., TLS configuration issues).
    pub fn new(max_bytes: usize) -> Result<Self, ThumbnailError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("resin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ThumbnailError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, max_bytes })
    }

    fn too_large(&self) -> ThumbnailError {
        ThumbnailError::acquisition(format!("Source exceeds {} bytes", self.max_bytes))
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self, source: &str) -> Result<FetchedSource, ThumbnailError> {
        let url = fetch_url(source);

        let mut response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ThumbnailError::acquisition(format!("HTTP fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ThumbnailError::acquisition(format!(
                "Upstream returned status {}",
                response.status().as_u16()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(len) = response.content_length() {
            if len as usize > self.max_bytes {
                return Err(self.too_large());
            }
        }

        let mut buf = BytesMut::with_capacity(8192);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ThumbnailError::acquisition(format!("Failed to read body: {}", e)))?
        {
            if buf.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large());
            }
            buf.extend_from_slice(&chunk);
        }

        Ok(FetchedSource {
            data: buf.freeze(),
            content_type,
        })
    }
}

/// In-memory fetcher serving pre-registered sources
///
/// Unknown sources fail the way a 404 from the upstream would.
#[derive(Clone, Default)]
pub struct StaticSourceFetcher {
    sources: Arc<RwLock<HashMap<String, FetchedSource>>>,
    requests: Arc<RwLock<Vec<String>>>,
}

impl StaticSourceFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source with its body and optional Content-Type
    pub fn with_source(
        self,
        source: impl Into<String>,
        data: impl Into<Bytes>,
        content_type: Option<&str>,
    ) -> Self {
        self.sources.write().insert(
            source.into(),
            FetchedSource {
                data: data.into(),
                content_type: content_type.map(str::to_string),
            },
        );
        self
    }

    /// Sources requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.read().clone()
    }
}

#[async_trait]
impl SourceFetcher for StaticSourceFetcher {
    async fn fetch(&self, source: &str) -> Result<FetchedSource, ThumbnailError> {
        self.requests.write().push(source.to_string());
        self.sources
            .read()
            .get(source)
            .cloned()
            .ok_or_else(|| ThumbnailError::acquisition("Upstream returned status 404"))
    }
}
