// End-to-end pipeline tests
//
// Each test drives RequestOrchestrator::handle with an in-memory fetcher:
// - allowlisted and signed sources produce exact-size images
// - rejected requests produce 422 JSON envelopes
// - configuration problems produce 500 before any fetch

use std::sync::Arc;

use image::GenericImageView;
use resin::config::Config;
use resin::thumbnail::{invoke, sign_source, ThumbnailUrl};

use super::test_harness::*;

#[tokio::test]
async fn test_allowlisted_source_returns_exact_jpeg() {
    let orchestrator = orchestrator(config(&["example.com"]));

    let envelope = orchestrator
        .handle(&request("200x100/https://img.example.com/cat.jpg", &[]))
        .await;

    assert_eq!(envelope.status, 200);
    assert_eq!(envelope.header("Content-type"), Some("image/jpeg"));
    assert_eq!(envelope.header("Cache-control"), Some("max-age=31536000"));

    let format = image::guess_format(envelope.body_bytes()).unwrap();
    assert_eq!(format, image::ImageFormat::Jpeg);
    let decoded = image::load_from_memory(envelope.body_bytes()).unwrap();
    assert_eq!(decoded.dimensions(), (200, 100));
}

#[tokio::test]
async fn test_unsigned_source_is_rejected() {
    let orchestrator = orchestrator(config(&[]));

    let envelope = orchestrator
        .handle(&request("200x100/https://img.example.com/cat.jpg", &[]))
        .await;

    assert_eq!(envelope.status, 422);
    assert_eq!(envelope.header("Content-type"), Some("application/json"));
    assert_eq!(envelope.header("Cache-control"), Some("max-age=0"));
    assert_eq!(
        error_body(envelope.body_bytes()),
        serde_json::json!({"error": "Failed to validate source file"})
    );
}

#[tokio::test]
async fn test_bad_dimensions_are_rejected() {
    let orchestrator = orchestrator(config(&["example.com"]));

    let envelope = orchestrator
        .handle(&request("abcx100/https://img.example.com/cat.jpg", &[]))
        .await;

    assert_eq!(envelope.status, 422);
    assert_eq!(
        error_body(envelope.body_bytes()),
        serde_json::json!({"error": "Missing width/height"})
    );
}

#[tokio::test]
async fn test_wrong_signature_is_rejected() {
    let orchestrator = orchestrator(config(&[]));

    let envelope = orchestrator
        .handle(&request(
            "200x100/https://img.example.com/cat.jpg",
            &[("sgn", "00000000000000000000000000000000")],
        ))
        .await;

    assert_eq!(envelope.status, 422);
}

#[tokio::test]
async fn test_signed_source_is_served() {
    let orchestrator = orchestrator(config(&[]));
    let sgn = sign_source(CAT_SOURCE, SECRET);

    let envelope = orchestrator
        .handle(&request(
            "64x64/https://img.example.com/cat.jpg",
            &[("sgn", sgn.as_str())],
        ))
        .await;

    assert_eq!(envelope.status, 200);
    let decoded = image::load_from_memory(envelope.body_bytes()).unwrap();
    assert_eq!(decoded.dimensions(), (64, 64));
}

#[tokio::test]
async fn test_percent_encoded_path_is_equivalent() {
    let orchestrator = orchestrator(config(&["example.com"]));

    let envelope = orchestrator
        .handle(&request(
            "120x90/https%3A%2F%2Fimg.example.com%2Fcat.jpg",
            &[],
        ))
        .await;

    assert_eq!(envelope.status, 200);
    let decoded = image::load_from_memory(envelope.body_bytes()).unwrap();
    assert_eq!(decoded.dimensions(), (120, 90));
}

#[tokio::test]
async fn test_minted_url_round_trips_through_pipeline() {
    let orchestrator = orchestrator(config(&[]));

    let url = ThumbnailUrl::new("https://thumbs.test", "https://cdn.partner.test/portrait.jpg")
        .dimensions(80, 40)
        .centering(0.5, 0.0)
        .unwrap()
        .signed(SECRET)
        .build()
        .unwrap();

    let rest = url.strip_prefix("https://thumbs.test/s/").unwrap();
    let (path, query) = rest.split_once('?').unwrap();
    let params: Vec<(&str, &str)> = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .collect();

    let envelope = orchestrator.handle(&request(path, &params)).await;

    assert_eq!(envelope.status, 200);
    // Transport content type is kept verbatim
    assert_eq!(envelope.header("Content-type"), Some("image/jpeg"));
    let decoded = image::load_from_memory(envelope.body_bytes()).unwrap();
    assert_eq!(decoded.dimensions(), (80, 40));
}

#[tokio::test]
async fn test_unreachable_source_is_500() {
    let orchestrator = orchestrator(config(&["example.com"]));

    let envelope = orchestrator
        .handle(&request("10x10/https://img.example.com/missing.png", &[]))
        .await;

    assert_eq!(envelope.status, 500);
    let body = error_body(envelope.body_bytes());
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to acquire source image"));
}

#[tokio::test]
async fn test_missing_signature_key_is_500() {
    let ctx = request("200x100/https://img.example.com/cat.jpg", &[]);
    let fetcher = fetcher();

    let envelope = invoke(Config::default(), fetcher.clone(), None, &ctx).await;

    assert_eq!(envelope.status, 500);
    assert_eq!(
        error_body(envelope.body_bytes()),
        serde_json::json!({"error": "Missing required configuration key"})
    );
    assert!(fetcher.requests().is_empty());
}

#[tokio::test]
async fn test_lambda_envelope_is_base64() {
    let ctx = request("20x20/https://img.example.com/cat.jpg", &[]);

    let envelope = invoke(config(&["example.com"]), fetcher(), None, &ctx).await;
    let lambda = envelope.to_lambda_json();

    assert_eq!(lambda["statusCode"], 200);
    assert_eq!(lambda["isBase64Encoded"], true);

    use base64::Engine as _;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(lambda["body"].as_str().unwrap())
        .unwrap();
    assert_eq!(bytes, envelope.body_bytes());
}

#[tokio::test]
async fn test_concurrent_requests_share_orchestrator() {
    let orchestrator = Arc::new(orchestrator(config(&["example.com", "partner.test"])));

    let mut handles = Vec::new();
    for size in [16u32, 32, 48, 64] {
        let orchestrator = orchestrator.clone();
        handles.push(tokio::spawn(async move {
            let path = format!("{}x{}/https://cdn.partner.test/portrait.jpg", size, size / 2);
            let envelope = orchestrator.handle(&request(&path, &[])).await;
            (size, envelope)
        }));
    }

    for handle in handles {
        let (size, envelope) = handle.await.unwrap();
        assert_eq!(envelope.status, 200);
        let decoded = image::load_from_memory(envelope.body_bytes()).unwrap();
        assert_eq!(decoded.dimensions(), (size, size / 2));
    }
}
