// Configuration unit tests against the public API

use resin::config::*;
use resin::error::ThumbnailError;

#[test]
fn test_can_deserialize_minimal_valid_yaml_config() {
    let yaml = r#"
signature_key: "k"
"#;
    let config: Config = serde_yaml::from_str(yaml).expect("Failed to deserialize YAML");

    assert_eq!(config.signature_key, "k");
    assert_eq!(config.server, ServerConfig::default());
    assert_eq!(config.storage, StorageConfig::default());
    assert_eq!(config.limits, LimitsConfig::default());
    assert!(config.validate().is_ok());
}

#[test]
fn test_can_deserialize_full_yaml_config() {
    let yaml = r#"
signature_key: "k"
known_domains:
  - example.com
  - cdn.partner.test
storage:
  upload_to_s3: true
  bucket_name: "thumbs"
  default_object_policy: "private"
  cache_control: "max-age=60"
  endpoint: "http://localhost:9000"
  region: "eu-west-1"
server:
  address: "127.0.0.1"
  port: 9090
  route_prefix: "/thumbs/"
limits:
  max_width: 2000
  max_height: 1000
  max_source_bytes: 1048576
  max_source_pixels: 4000000
"#;
    let config: Config = serde_yaml::from_str(yaml).expect("Failed to deserialize YAML");

    assert_eq!(config.known_domains.len(), 2);
    assert_eq!(config.storage.bucket(), Some("thumbs"));
    assert_eq!(config.storage.endpoint.as_deref(), Some("http://localhost:9000"));
    assert_eq!(config.storage.region.as_deref(), Some("eu-west-1"));
    assert_eq!(config.server.listen_addr(), "127.0.0.1:9090");
    assert_eq!(config.server.route_prefix, "/thumbs/");
    assert_eq!(config.limits.max_width, Some(2000));
    assert_eq!(config.limits.max_height, Some(1000));
    assert_eq!(config.limits.max_source_pixels, 4_000_000);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_round_trips_through_yaml() {
    let config = Config {
        signature_key: "k".to_string(),
        known_domains: vec!["example.com".to_string()],
        ..Default::default()
    };

    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed: Config = serde_yaml::from_str(&yaml).unwrap();

    assert_eq!(parsed, config);
}

#[test]
fn test_zero_limits_are_rejected() {
    let mut config = Config {
        signature_key: "k".to_string(),
        ..Default::default()
    };
    config.limits.max_width = Some(0);

    assert!(matches!(
        config.validate(),
        Err(ThumbnailError::Configuration { .. })
    ));
}

#[test]
fn test_blank_signature_key_is_missing() {
    let config = Config {
        signature_key: "   ".to_string(),
        ..Default::default()
    };
    assert_eq!(
        config.validate().unwrap_err().to_string(),
        "Missing required configuration key"
    );
}
