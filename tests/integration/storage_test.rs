// Storage publishing tests against the in-memory object store

use resin::thumbnail::MemoryObjectStore;

use super::test_harness::*;

#[tokio::test]
async fn test_thumbnail_is_published_under_output_path() {
    let store = MemoryObjectStore::new();
    let orchestrator =
        publishing_orchestrator(publishing_config(&["example.com"], "thumbs"), &store);

    let envelope = orchestrator
        .handle(&request("200x100/https://img.example.com/cat.jpg", &[]))
        .await;
    assert_eq!(envelope.status, 200);

    let objects = store.objects();
    assert_eq!(objects.len(), 1);
    let stored = &objects[0];
    assert_eq!(stored.bucket, "thumbs");
    assert_eq!(stored.key, "s/200x100/https%3A%2F%2Fimg.example.com%2Fcat.jpg");
    assert_eq!(stored.content_type, "image/jpeg");
    assert_eq!(stored.cache_control, "max-age=31536000");
    assert_eq!(stored.acl, "public-read");
    assert_eq!(stored.body.as_ref(), envelope.body_bytes());
}

#[tokio::test]
async fn test_encoded_and_plain_requests_share_storage_key() {
    let store = MemoryObjectStore::new();
    let orchestrator =
        publishing_orchestrator(publishing_config(&["example.com"], "thumbs"), &store);

    orchestrator
        .handle(&request("50x50/https://img.example.com/cat.jpg", &[]))
        .await;
    orchestrator
        .handle(&request("50x50/https%3A%2F%2Fimg.example.com%2Fcat.jpg", &[]))
        .await;

    let keys: Vec<String> = store.objects().into_iter().map(|o| o.key).collect();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0], keys[1]);
}

#[tokio::test]
async fn test_custom_policy_and_cache_control() {
    let store = MemoryObjectStore::new();
    let mut config = publishing_config(&["example.com"], "thumbs");
    config.storage.default_object_policy = "private".to_string();
    config.storage.cache_control = "max-age=600".to_string();
    let orchestrator = publishing_orchestrator(config, &store);

    orchestrator
        .handle(&request("10x10/https://img.example.com/cat.jpg", &[]))
        .await;

    let stored = store.get("thumbs", "s/10x10/https%3A%2F%2Fimg.example.com%2Fcat.jpg").unwrap();
    assert_eq!(stored.acl, "private");
    assert_eq!(stored.cache_control, "max-age=600");
}

#[tokio::test]
async fn test_rejected_request_publishes_nothing() {
    let store = MemoryObjectStore::new();
    let orchestrator = publishing_orchestrator(publishing_config(&[], "thumbs"), &store);

    let envelope = orchestrator
        .handle(&request("10x10/https://img.example.com/cat.jpg", &[]))
        .await;

    assert_eq!(envelope.status, 422);
    assert!(store.objects().is_empty());
}

#[tokio::test]
async fn test_store_failure_fails_request() {
    let store = MemoryObjectStore::new();
    store.set_unavailable(true);
    let orchestrator =
        publishing_orchestrator(publishing_config(&["example.com"], "thumbs"), &store);

    let envelope = orchestrator
        .handle(&request("10x10/https://img.example.com/cat.jpg", &[]))
        .await;

    assert_eq!(envelope.status, 500);
    assert_eq!(
        error_body(envelope.body_bytes()),
        serde_json::json!({"error": "Failed to store thumbnail: Backend unavailable"})
    );
}
