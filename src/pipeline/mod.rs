// Request pipeline module - per-request context handed to the orchestrator

use std::collections::HashMap;
use uuid::Uuid;

/// Request context that holds everything the thumbnail pipeline needs
/// about one inbound request
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    method: String,
    path: String,
    query_params: HashMap<String, String>,
    client_ip: Option<String>,
}

impl RequestContext {
    /// Create a new RequestContext for a thumbnail path (`<w>x<h>/<source>`)
    /// Automatically generates a unique request ID (UUID v4)
    pub fn new(method: String, path: String) -> Self {
        Self::with_query_params(method, path, HashMap::new())
    }

    /// Create a new RequestContext with query parameters
    pub fn with_query_params(
        method: String,
        path: String,
        query_params: HashMap<String, String>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            method,
            path,
            query_params,
            client_ip: None,
        }
    }

    /// Attach the client address (for logging)
    pub fn with_client_ip(mut self, client_ip: impl Into<String>) -> Self {
        self.client_ip = Some(client_ip.into());
        self
    }

    /// Get the unique request ID
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Get the HTTP method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Get the thumbnail path, route prefix already stripped
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the query parameters
    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    pub fn client_ip(&self) -> Option<&str> {
        self.client_ip.as_deref()
    }
}
