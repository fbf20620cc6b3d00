//! Thumbnail request parsing
//!
//! Turns the inbound path `<width>x<height>/<source>` into a typed
//! [`ThumbnailRequest`]. The path is URL-decoded exactly once before it is
//! split, so `200x100/https%3A%2F%2Fimg.example.com%2Fcat.jpg` and
//! `200x100/https://img.example.com/cat.jpg` describe the same request and
//! map to the same storage key.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use super::security::escape_source;
use crate::config::LimitsConfig;
use crate::constants::{DEFAULT_CROP_CENTERING, OUTPUT_PATH_PREFIX};
use crate::error::ThumbnailError;

/// Query parameter carrying an optional crop anchor (`c=0.25,0.75`)
pub const CENTERING_PARAM: &str = "c";

/// A parsed, immutable thumbnail request
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailRequest {
    /// Source URL (or `domain/path`) as it appeared after decoding
    pub source: String,
    pub width: u32,
    pub height: u32,
    /// Reserved; always 0.0
    pub bleed: f32,
    /// Fractional crop anchor, each coordinate in [0, 1]
    pub crop_centering: (f32, f32),
    /// Deterministic storage key for this (dimensions, source) pair
    pub output_path: String,
}

fn dimensions_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]+x[0-9]+$").expect("valid dimensions pattern"))
}

fn missing_dimensions() -> ThumbnailError {
    ThumbnailError::malformed("Missing width/height")
}

/// Parse a `<width>x<height>` token into positive pixel dimensions
pub fn parse_dimensions(token: &str) -> Result<(u32, u32), ThumbnailError> {
    if !dimensions_pattern().is_match(token) {
        return Err(missing_dimensions());
    }

    let (width, height) = token.split_once('x').ok_or_else(missing_dimensions)?;
    let width: u32 = width.parse().map_err(|_| missing_dimensions())?;
    let height: u32 = height.parse().map_err(|_| missing_dimensions())?;

    if width == 0 || height == 0 {
        return Err(missing_dimensions());
    }

    Ok((width, height))
}

/// Parse a `x,y` crop anchor; both coordinates must lie in [0, 1]
pub fn parse_centering(value: &str) -> Result<(f32, f32), ThumbnailError> {
    let out_of_range = || ThumbnailError::malformed("Only values between 0 and 1 are allowed");

    let (x, y) = value.split_once(',').ok_or_else(out_of_range)?;
    let x: f32 = x.trim().parse().map_err(|_| out_of_range())?;
    let y: f32 = y.trim().parse().map_err(|_| out_of_range())?;

    if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
        return Err(out_of_range());
    }

    Ok((x, y))
}

/// Route-relative thumbnail path: `<width>x<height>/<escaped source>`
///
/// The token is rebuilt from the parsed integers, so `0640x0480` and
/// `640x480` share one path.
pub fn thumbnail_path_for(width: u32, height: u32, source: &str) -> String {
    format!("{}x{}/{}", width, height, escape_source(source))
}

/// Storage key for a thumbnail: `s/<width>x<height>/<escaped source>`
pub fn output_path_for(width: u32, height: u32, source: &str) -> String {
    format!(
        "{}/{}",
        OUTPUT_PATH_PREFIX,
        thumbnail_path_for(width, height, source)
    )
}

/// Parse the inbound path and query parameters into a [`ThumbnailRequest`]
///
/// # Errors
///
/// Returns `MalformedRequest` when the path is empty, the first segment is
/// not `<digits>x<digits>`, the source is empty, the dimensions exceed the
/// configured limits, or the crop anchor is out of range.
pub fn parse_request(
    path: &str,
    query: &HashMap<String, String>,
    limits: &LimitsConfig,
) -> Result<ThumbnailRequest, ThumbnailError> {
    if path.is_empty() {
        return Err(ThumbnailError::malformed("Malformed path"));
    }

    let decoded =
        urlencoding::decode(path).map_err(|_| ThumbnailError::malformed("Malformed path"))?;

    let mut segments = decoded.split('/');
    let token = segments.next().unwrap_or_default();
    let (width, height) = parse_dimensions(token)?;

    let exceeds = |value: u32, limit: Option<u32>| matches!(limit, Some(max) if value > max);
    if exceeds(width, limits.max_width) || exceeds(height, limits.max_height) {
        return Err(ThumbnailError::malformed(
            "Requested dimensions exceed limit",
        ));
    }

    let source = segments.collect::<Vec<_>>().join("/");
    if source.is_empty() {
        return Err(ThumbnailError::malformed("Missing source"));
    }

    let crop_centering = match query.get(CENTERING_PARAM) {
        Some(value) => parse_centering(value)?,
        None => DEFAULT_CROP_CENTERING,
    };

    let output_path = output_path_for(width, height, &source);

    Ok(ThumbnailRequest {
        source,
        width,
        height,
        bleed: 0.0,
        crop_centering,
        output_path,
    })
}
