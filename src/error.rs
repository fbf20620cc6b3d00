//! Thumbnail pipeline error types
//!
//! Every pipeline stage returns `Result<_, ThumbnailError>`. The orchestrator
//! maps the variant to an HTTP status and renders the message as the
//! `{"error": ...}` body, so `Display` must never include internal details
//! beyond the message carried by the variant.

use std::fmt;

/// Errors that can occur while turning a request path into a thumbnail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailError {
    /// Required configuration is missing or invalid (secret key, bucket name)
    Configuration { message: String },

    /// The inbound path could not be parsed into a thumbnail request
    MalformedRequest { message: String },

    /// The source is neither allowlisted nor correctly signed
    AuthenticationFailure { message: String },

    /// The source could not be fetched or decoded
    AcquisitionFailure { message: String },

    /// The transformed image could not be serialized
    EncodeFailure { message: String },

    /// Writing the thumbnail to object storage failed
    StorageFailure { message: String },
}

impl fmt::Display for ThumbnailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThumbnailError::Configuration { message }
            | ThumbnailError::MalformedRequest { message }
            | ThumbnailError::AuthenticationFailure { message } => write!(f, "{}", message),
            ThumbnailError::AcquisitionFailure { message } => {
                write!(f, "Failed to acquire source image: {}", message)
            }
            ThumbnailError::EncodeFailure { message } => {
                write!(f, "Failed to encode image: {}", message)
            }
            ThumbnailError::StorageFailure { message } => {
                write!(f, "Failed to store thumbnail: {}", message)
            }
        }
    }
}

impl std::error::Error for ThumbnailError {}

impl ThumbnailError {
    /// Maps pipeline errors to HTTP status codes
    ///
    /// - Configuration → 500
    /// - MalformedRequest, AuthenticationFailure → 422
    /// - AcquisitionFailure, EncodeFailure, StorageFailure → 500
    pub fn to_http_status(&self) -> u16 {
        match self {
            ThumbnailError::MalformedRequest { .. }
            | ThumbnailError::AuthenticationFailure { .. } => 422,

            ThumbnailError::Configuration { .. }
            | ThumbnailError::AcquisitionFailure { .. }
            | ThumbnailError::EncodeFailure { .. }
            | ThumbnailError::StorageFailure { .. } => 500,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        ThumbnailError::Configuration {
            message: message.into(),
        }
    }

    /// The single message used for every missing configuration key
    pub fn missing_configuration() -> Self {
        Self::configuration("Missing required configuration key")
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        ThumbnailError::MalformedRequest {
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        ThumbnailError::AuthenticationFailure {
            message: message.into(),
        }
    }

    pub fn acquisition(message: impl Into<String>) -> Self {
        ThumbnailError::AcquisitionFailure {
            message: message.into(),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        ThumbnailError::EncodeFailure {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        ThumbnailError::StorageFailure {
            message: message.into(),
        }
    }
}
