//! Object storage publishing configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_OBJECT_POLICY, DEFAULT_STORAGE_CACHE_CONTROL};

fn default_object_policy() -> String {
    DEFAULT_OBJECT_POLICY.to_string()
}

fn default_cache_control() -> String {
    DEFAULT_STORAGE_CACHE_CONTROL.to_string()
}

/// Where (and whether) generated thumbnails are written back to S3
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Upload every generated thumbnail (default: false)
    #[serde(default)]
    pub upload_to_s3: bool,

    /// Destination bucket, mandatory when `upload_to_s3` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,

    /// Canned ACL for written objects (default: public-read)
    #[serde(default = "default_object_policy")]
    pub default_object_policy: String,

    /// Cache-Control metadata for written objects
    #[serde(default = "default_cache_control")]
    pub cache_control: String,

    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_to_s3: false,
            bucket_name: None,
            default_object_policy: default_object_policy(),
            cache_control: default_cache_control(),
            endpoint: None,
            region: None,
        }
    }
}

impl StorageConfig {
    /// Bucket name, if one is configured and non-blank
    pub fn bucket(&self) -> Option<&str> {
        self.bucket_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
