//! Response envelopes
//!
//! Produced once per request by the orchestrator. The HTTP front end writes
//! the body as raw bytes; the CLI invoke mode prints the Lambda proxy form
//! with a base64 body.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;

use crate::constants::{ERROR_CACHE_CONTROL, ERROR_CONTENT_TYPE, SUCCESS_CACHE_CONTROL};
use crate::error::ThumbnailError;

pub const CONTENT_TYPE_HEADER: &str = "Content-type";
pub const CACHE_CONTROL_HEADER: &str = "Cache-control";

/// Response body
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Encoded image bytes
    Binary(Vec<u8>),
    /// Serialized JSON document
    Json(String),
}

/// Status, headers and body of a single response
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Body,
}

impl ResponseEnvelope {
    /// 200 with a year-long cache lifetime
    pub fn image(mime_type: &str, data: Vec<u8>) -> Self {
        Self {
            status: 200,
            headers: vec![
                (CONTENT_TYPE_HEADER, mime_type.to_string()),
                (CACHE_CONTROL_HEADER, SUCCESS_CACHE_CONTROL.to_string()),
            ],
            body: Body::Binary(data),
        }
    }

    /// Uncacheable `{"error": "..."}` response
    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            headers: vec![
                (CONTENT_TYPE_HEADER, ERROR_CONTENT_TYPE.to_string()),
                (CACHE_CONTROL_HEADER, ERROR_CACHE_CONTROL.to_string()),
            ],
            body: Body::Json(json!({ "error": message }).to_string()),
        }
    }

    pub fn from_error(err: &ThumbnailError) -> Self {
        Self::error(err.to_http_status(), &err.to_string())
    }

    /// Plain JSON response (health checks)
    pub fn json(status: u16, body: String) -> Self {
        Self {
            status,
            headers: vec![(CONTENT_TYPE_HEADER, ERROR_CONTENT_TYPE.to_string())],
            body: Body::Json(body),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_base64_encoded(&self) -> bool {
        matches!(self.body, Body::Binary(_))
    }

    /// Body bytes as written to an HTTP connection
    pub fn body_bytes(&self) -> &[u8] {
        match &self.body {
            Body::Binary(data) => data,
            Body::Json(text) => text.as_bytes(),
        }
    }

    /// Body as it appears in the Lambda envelope: base64 for images
    pub fn wire_body(&self) -> String {
        match &self.body {
            Body::Binary(data) => STANDARD.encode(data),
            Body::Json(text) => text.clone(),
        }
    }

    /// Lambda proxy integration form
    pub fn to_lambda_json(&self) -> serde_json::Value {
        let headers: serde_json::Map<String, serde_json::Value> = self
            .headers
            .iter()
            .map(|(key, value)| (key.to_string(), serde_json::Value::String(value.clone())))
            .collect();

        json!({
            "statusCode": self.status,
            "headers": headers,
            "body": self.wire_body(),
            "isBase64Encoded": self.is_base64_encoded(),
        })
    }
}
