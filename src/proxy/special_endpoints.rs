//! Special endpoint handlers (/health).
//!
//! Functions return a `ResponseEnvelope` instead of writing directly to the
//! session. The caller handles writing the response to the session.

use std::time::Instant;

use crate::thumbnail::ResponseEnvelope;

/// Path of the liveness endpoint
pub const HEALTH_PATH: &str = "/health";

/// Generate response for /health endpoint.
///
/// Returns 200 with uptime and version; the service has no backends that
/// must be reachable for it to answer.
pub fn handle_health(start_time: Instant) -> ResponseEnvelope {
    let uptime_seconds = start_time.elapsed().as_secs();
    let version = env!("CARGO_PKG_VERSION");

    let body = serde_json::json!({
        "status": "healthy",
        "uptime_seconds": uptime_seconds,
        "version": version
    })
    .to_string();

    ResponseEnvelope::json(200, body)
}

/// Generate the response for paths outside the thumbnail route.
pub fn handle_not_found() -> ResponseEnvelope {
    ResponseEnvelope::error(404, "Not found")
}

/// Generate the response for methods other than GET/HEAD.
pub fn handle_method_not_allowed() -> ResponseEnvelope {
    ResponseEnvelope::error(405, "Method not allowed")
}
