//! Object storage publishing
//!
//! Generated thumbnails can be written back to a bucket under the request's
//! output path, so a CDN in front of the bucket serves repeat requests
//! without touching this service.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use parking_lot::RwLock;
use thiserror::Error;

use crate::config::StorageConfig;
use crate::error::ThumbnailError;

/// Errors raised by an [`ObjectStore`]
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("put_object failed: {0}")]
    Put(String),

    #[error("Backend unavailable")]
    BackendUnavailable,
}

impl From<StorageError> for ThumbnailError {
    fn from(err: StorageError) -> Self {
        ThumbnailError::storage(err.to_string())
    }
}

/// A single object write
#[derive(Debug, Clone, PartialEq)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
    pub cache_control: String,
    /// Canned ACL, e.g. `public-read`
    pub acl: String,
}

/// Destination for published thumbnails
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, request: PutObjectRequest) -> Result<(), StorageError>;
}

/// S3 (or S3-compatible) object store
#[derive(Clone)]
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient AWS credential chain
    ///
    /// A custom endpoint switches to path-style addressing, which MinIO and
    /// LocalStack expect.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.endpoint.is_some())
            .build();

        Self::new(S3Client::from_conf(s3_config))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, request: PutObjectRequest) -> Result<(), StorageError> {
        let size = request.body.len();

        let output = self
            .client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .body(ByteStream::from(request.body))
            .content_type(&request.content_type)
            .cache_control(&request.cache_control)
            .acl(ObjectCannedAcl::from(request.acl.as_str()))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(bucket = %request.bucket, key = %request.key, error = %e, "S3 put_object failed");
                StorageError::Put(e.to_string())
            })?;

        tracing::debug!(
            bucket = %request.bucket,
            key = %request.key,
            bytes = size,
            etag = ?output.e_tag(),
            "Stored thumbnail in S3"
        );

        Ok(())
    }
}

/// In-memory object store
///
/// Records every write. Used for `--dry-run` and in tests.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<Vec<PutObjectRequest>>>,
    unavailable: Arc<RwLock<bool>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail (or succeed again)
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write() = unavailable;
    }

    pub fn objects(&self) -> Vec<PutObjectRequest> {
        self.objects.read().clone()
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<PutObjectRequest> {
        self.objects
            .read()
            .iter()
            .rev()
            .find(|o| o.bucket == bucket && o.key == key)
            .cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(&self, request: PutObjectRequest) -> Result<(), StorageError> {
        if *self.unavailable.read() {
            return Err(StorageError::BackendUnavailable);
        }
        self.objects.write().push(request);
        Ok(())
    }
}

/// Writes thumbnails to the configured bucket with the configured metadata
#[derive(Clone)]
pub struct StoragePublisher {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    object_policy: String,
    cache_control: String,
}

impl StoragePublisher {
    /// # Errors
    ///
    /// Returns `Configuration` when no bucket name is configured.
    pub fn new(store: Arc<dyn ObjectStore>, config: &StorageConfig) -> Result<Self, ThumbnailError> {
        let bucket = config
            .bucket()
            .ok_or_else(ThumbnailError::missing_configuration)?;

        Ok(Self {
            store,
            bucket: bucket.to_string(),
            object_policy: config.default_object_policy.clone(),
            cache_control: config.cache_control.clone(),
        })
    }

    /// Write `data` under `key`
    pub async fn publish(
        &self,
        data: Bytes,
        key: &str,
        mime_type: &str,
    ) -> Result<(), ThumbnailError> {
        let request = PutObjectRequest {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            body: data,
            content_type: mime_type.to_string(),
            cache_control: self.cache_control.clone(),
            acl: self.object_policy.clone(),
        };

        self.store.put_object(request).await?;

        tracing::info!(bucket = %self.bucket, key = %key, "Thumbnail published");
        Ok(())
    }
}
