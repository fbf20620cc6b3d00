// Configuration module
//
// Configuration is loaded once at process start, validated, and then shared
// read-only (`Arc<Config>`) by every request.

pub mod server;
pub mod storage;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ThumbnailError;

pub use server::{LimitsConfig, ServerConfig};
pub use storage::StorageConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Shared secret mixed into every source signature
    #[serde(default)]
    pub signature_key: String,

    /// Domain tokens that bypass signature validation
    #[serde(default)]
    pub known_domains: Vec<String>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Split a comma-separated allowlist, dropping blank entries
pub fn parse_known_domains(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|domain| !domain.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Config {
    /// Build configuration from process environment variables
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `SIGNATURE_KEY` | `signature_key` |
    /// | `KNOWN_DOMAINS` | `known_domains` (comma separated) |
    /// | `UPLOAD_TO_S3` | `storage.upload_to_s3` (`1`/`true`) |
    /// | `BUCKET_NAME` | `storage.bucket_name` |
    /// | `DEFAULT_OBJECT_POLICY` | `storage.default_object_policy` |
    /// | `CACHE_CONTROL` | `storage.cache_control` |
    /// | `S3_ENDPOINT`, `S3_REGION` | `storage.endpoint`, `storage.region` |
    /// | `LISTEN_ADDRESS`, `LISTEN_PORT` | `server.address`, `server.port` |
    pub fn from_env() -> Result<Self, ThumbnailError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ThumbnailError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(key) = lookup("SIGNATURE_KEY") {
            config.signature_key = key;
        }
        if let Some(domains) = lookup("KNOWN_DOMAINS") {
            config.known_domains = parse_known_domains(&domains);
        }
        if let Some(flag) = lookup("UPLOAD_TO_S3") {
            config.storage.upload_to_s3 = parse_flag(&flag);
        }
        config.storage.bucket_name = lookup("BUCKET_NAME");
        if let Some(policy) = lookup("DEFAULT_OBJECT_POLICY").filter(|p| !p.trim().is_empty()) {
            config.storage.default_object_policy = policy;
        }
        if let Some(cache_control) = lookup("CACHE_CONTROL").filter(|c| !c.trim().is_empty()) {
            config.storage.cache_control = cache_control;
        }
        config.storage.endpoint = lookup("S3_ENDPOINT");
        config.storage.region = lookup("S3_REGION");

        if let Some(address) = lookup("LISTEN_ADDRESS") {
            config.server.address = address;
        }
        if let Some(port) = lookup("LISTEN_PORT") {
            config.server.port = port.trim().parse().map_err(|_| {
                ThumbnailError::configuration(format!("Invalid LISTEN_PORT '{}'", port))
            })?;
        }

        Ok(config)
    }

    /// Parse YAML, replacing `${VAR_NAME}` with environment variable values
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ThumbnailError> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ThumbnailError::configuration(e.to_string()))?;

        // Check that all referenced environment variables exist before substituting
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                ThumbnailError::configuration(format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                ))
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        serde_yaml::from_str(&substituted).map_err(|e| ThumbnailError::configuration(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ThumbnailError> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            ThumbnailError::configuration(format!("Failed to read config file: {}", e))
        })?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Fail fast when a required key is missing
    ///
    /// The signature key is always required; the bucket name is required
    /// only when publishing to S3 is enabled.
    pub fn validate(&self) -> Result<(), ThumbnailError> {
        if self.signature_key.trim().is_empty() {
            return Err(ThumbnailError::missing_configuration());
        }

        if self.storage.upload_to_s3 && self.storage.bucket().is_none() {
            return Err(ThumbnailError::missing_configuration());
        }

        if self.limits.max_width == Some(0) || self.limits.max_height == Some(0) {
            return Err(ThumbnailError::configuration(
                "Dimension limits must be greater than 0",
            ));
        }

        if !self.server.route_prefix.starts_with('/') || !self.server.route_prefix.ends_with('/')
        {
            return Err(ThumbnailError::configuration(format!(
                "Route prefix '{}' must start and end with /",
                self.server.route_prefix
            )));
        }

        Ok(())
    }
}
