//! Proxy utility functions.
//!
//! This module contains helper functions for request processing:
//! - Query parameter parsing
//! - Route prefix matching
//! - Client IP detection (X-Forwarded-For aware)

use std::collections::HashMap;

use pingora_http::RequestHeader;
use pingora_proxy::Session;

/// Extract query parameters from URI.
///
/// Parses the query string from the request URI and returns key-value pairs.
/// Values are URL-decoded.
pub fn extract_query_params(req: &RequestHeader) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if let Some(query) = req.uri.query() {
        for pair in query.split('&') {
            if let Some((key, value)) = pair.split_once('=') {
                params.insert(
                    key.to_string(),
                    urlencoding::decode(value).unwrap_or_default().to_string(),
                );
            }
        }
    }
    params
}

/// Return the thumbnail path (`<w>x<h>/<source>`) under `prefix`, if the
/// request path is routed to the thumbnail service.
///
/// The remainder is returned still percent-encoded; it is decoded once by
/// the request parser.
pub fn strip_route_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    path.strip_prefix(prefix)
}

/// Extract client IP address from session (X-Forwarded-For aware).
///
/// Checks X-Forwarded-For header first (for proxies/load balancers),
/// then falls back to direct connection IP from session.
///
/// # X-Forwarded-For handling
///
/// The header can contain multiple IPs: `"client, proxy1, proxy2"`.
/// The first IP is the original client, which is what we return.
pub fn get_client_ip(session: &Session) -> String {
    if let Some(forwarded_for) = session
        .req_header()
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(client_ip) = forwarded_for.split(',').next() {
            return client_ip.trim().to_string();
        }
    }

    session
        .client_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
