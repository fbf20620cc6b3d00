//! End-to-end request handling
//!
//! ```text
//! Received → Parsed → Validated → Acquired → Transformed → Encoded → (Published) → Responded
//! ```
//!
//! Every stage returns `Result<_, ThumbnailError>`; the first failure ends the
//! request and is rendered as an error envelope. Nothing is retried.

use std::sync::Arc;

use bytes::Bytes;
use tracing::Instrument;

use super::acquire::{acquire, SourceFetcher};
use super::encoder::encode_asset;
use super::request::parse_request;
use super::response::ResponseEnvelope;
use super::security::{validate_source, SecurityConfig, SIGNATURE_PARAM};
use super::storage::{ObjectStore, StoragePublisher};
use super::transform::thumbnail;
use crate::config::Config;
use crate::error::ThumbnailError;
use crate::pipeline::RequestContext;

/// Runs the thumbnail pipeline for each request
#[derive(Clone)]
pub struct RequestOrchestrator {
    config: Arc<Config>,
    security: SecurityConfig,
    fetcher: Arc<dyn SourceFetcher>,
    publisher: Option<StoragePublisher>,
}

impl RequestOrchestrator {
    /// # Errors
    ///
    /// Returns `Configuration` when the configuration does not validate, or
    /// when publishing is enabled but no object store was supplied.
    pub fn new(
        config: Arc<Config>,
        fetcher: Arc<dyn SourceFetcher>,
        store: Option<Arc<dyn ObjectStore>>,
    ) -> Result<Self, ThumbnailError> {
        config.validate()?;

        let publisher = if config.storage.upload_to_s3 {
            let store = store.ok_or_else(|| {
                ThumbnailError::configuration("Storage publishing enabled without an object store")
            })?;
            Some(StoragePublisher::new(store, &config.storage)?)
        } else {
            None
        };

        Ok(Self {
            security: SecurityConfig::from_config(&config),
            config,
            fetcher,
            publisher,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle one request; failures become error envelopes
    pub async fn handle(&self, ctx: &RequestContext) -> ResponseEnvelope {
        let span = tracing::info_span!(
            "thumbnail",
            request_id = %ctx.request_id(),
            path = %ctx.path()
        );

        async {
            match self.process(ctx).await {
                Ok(envelope) => {
                    tracing::info!(status = envelope.status, "Thumbnail served");
                    envelope
                }
                Err(e) => {
                    let status = e.to_http_status();
                    if status >= 500 {
                        tracing::error!(status, error = %e, "Thumbnail request failed");
                    } else {
                        tracing::warn!(status, error = %e, "Thumbnail request rejected");
                    }
                    ResponseEnvelope::from_error(&e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Run every stage, stopping at the first error
    pub async fn process(&self, ctx: &RequestContext) -> Result<ResponseEnvelope, ThumbnailError> {
        let limits = &self.config.limits;

        let request = parse_request(ctx.path(), ctx.query_params(), limits)?;
        tracing::debug!(
            source = %request.source,
            width = request.width,
            height = request.height,
            "Request parsed"
        );

        let outcome = validate_source(
            &request.source,
            ctx.query_param(SIGNATURE_PARAM),
            &self.security,
        )?;
        tracing::debug!(outcome = ?outcome, "Source validated");

        let asset = acquire(self.fetcher.as_ref(), &request.source).await?;
        let mime_type = asset.mime_type.clone();
        let output_path = request.output_path.clone();
        let max_pixels = limits.max_source_pixels;

        let encoded = tokio::task::spawn_blocking(move || {
            let transformed = thumbnail(&asset, &request, max_pixels)?;
            tracing::debug!("Source transformed");
            encode_asset(&transformed, None, max_pixels)
        })
        .await
        .map_err(|e| ThumbnailError::encode(format!("Worker task failed: {}", e)))??;

        if let Some(publisher) = &self.publisher {
            publisher
                .publish(Bytes::from(encoded.data.clone()), &output_path, &mime_type)
                .await?;
        }

        Ok(ResponseEnvelope::image(&mime_type, encoded.data))
    }
}

/// One-shot invocation: build an orchestrator and handle a single request
///
/// Configuration problems are reported as a 500 envelope instead of an error,
/// matching what a caller of the deployed function would see.
pub async fn invoke(
    config: Config,
    fetcher: Arc<dyn SourceFetcher>,
    store: Option<Arc<dyn ObjectStore>>,
    ctx: &RequestContext,
) -> ResponseEnvelope {
    match RequestOrchestrator::new(Arc::new(config), fetcher, store) {
        Ok(orchestrator) => orchestrator.handle(ctx).await,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            ResponseEnvelope::from_error(&e)
        }
    }
}
