// Constants module - centralized default values for configuration
//
// This module defines the default values used throughout the codebase.
// Using constants instead of magic numbers improves maintainability
// and makes it easier to understand and modify defaults.

// =============================================================================
// Server defaults
// =============================================================================

/// Default listen address
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_LISTEN_PORT: u16 = 8080;

/// Route prefix under which thumbnail requests are served
pub const DEFAULT_ROUTE_PREFIX: &str = "/s/";

/// Path segment prepended to every storage key (mirrors the route prefix)
pub const OUTPUT_PATH_PREFIX: &str = "s";

// =============================================================================
// Storage defaults
// =============================================================================

/// Default canned ACL applied to published thumbnails
pub const DEFAULT_OBJECT_POLICY: &str = "public-read";

/// Default Cache-Control value stored alongside published thumbnails
pub const DEFAULT_STORAGE_CACHE_CONTROL: &str = "max-age=31536000";

// =============================================================================
// Response defaults
// =============================================================================

/// Cache-Control header sent with a successfully generated thumbnail
pub const SUCCESS_CACHE_CONTROL: &str = "max-age=31536000";

/// Cache-Control header sent with every error response
pub const ERROR_CACHE_CONTROL: &str = "max-age=0";

/// Content-Type of every error response
pub const ERROR_CONTENT_TYPE: &str = "application/json";

// =============================================================================
// Image defaults
// =============================================================================

/// Transport content type that carries no information about the payload
pub const GENERIC_MIME_TYPE: &str = "application/octet-stream";

/// Output format used when the source has no recognizable extension
pub const DEFAULT_OUTPUT_FORMAT: &str = "png";

/// Encoder quality for lossy formats (always maximum)
pub const ENCODER_QUALITY: u8 = 100;

/// Default crop anchor (centered on both axes)
pub const DEFAULT_CROP_CENTERING: (f32, f32) = (0.5, 0.5);

// =============================================================================
// Limit defaults
// =============================================================================

/// Default maximum source payload size (50 MB)
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 50 * 1024 * 1024;

/// Default maximum decoded source pixels (100 megapixels)
pub const DEFAULT_MAX_SOURCE_PIXELS: u64 = 100_000_000;
