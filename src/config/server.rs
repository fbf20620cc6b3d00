//! Server configuration types.
//!
//! This module defines the server-level configuration including:
//! - Address and port bindings
//! - The route prefix thumbnail requests are served under
//! - Request limits (optional dimension caps, source size and pixel caps)
//!
//! Default values are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_LISTEN_ADDRESS, DEFAULT_LISTEN_PORT, DEFAULT_MAX_SOURCE_BYTES,
    DEFAULT_MAX_SOURCE_PIXELS, DEFAULT_ROUTE_PREFIX,
};

fn default_address() -> String {
    DEFAULT_LISTEN_ADDRESS.to_string()
}

fn default_port() -> u16 {
    DEFAULT_LISTEN_PORT
}

fn default_route_prefix() -> String {
    DEFAULT_ROUTE_PREFIX.to_string()
}

fn default_max_source_bytes() -> usize {
    DEFAULT_MAX_SOURCE_BYTES
}

fn default_max_source_pixels() -> u64 {
    DEFAULT_MAX_SOURCE_PIXELS
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path prefix thumbnail requests are served under (default: "/s/")
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            route_prefix: default_route_prefix(),
        }
    }
}

impl ServerConfig {
    /// Socket address the HTTP listener binds to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Request and source limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimitsConfig {
    /// Maximum requested thumbnail width in pixels (default: unlimited)
    #[serde(default)]
    pub max_width: Option<u32>,
    /// Maximum requested thumbnail height in pixels (default: unlimited)
    #[serde(default)]
    pub max_height: Option<u32>,
    /// Maximum source payload in bytes (default: 50 MB)
    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: usize,
    /// Maximum decoded source pixels (default: 100 megapixels)
    #[serde(default = "default_max_source_pixels")]
    pub max_source_pixels: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_width: None,
            max_height: None,
            max_source_bytes: default_max_source_bytes(),
            max_source_pixels: default_max_source_pixels(),
        }
    }
}
