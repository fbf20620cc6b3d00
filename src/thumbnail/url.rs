//! Client-side thumbnail URL minting
//!
//! Builds URLs the service accepts, signing sources that are not on the
//! allowlist, and renders `srcset` strings for high-density displays.
//!
//! ```
//! use resin::thumbnail::url::ThumbnailUrl;
//!
//! let url = ThumbnailUrl::new("https://thumbs.example.com/", "https://img.example.com/cat.jpg")
//!     .dimensions(200, 100)
//!     .signed("secret")
//!     .build()
//!     .unwrap();
//! assert!(url.starts_with("https://thumbs.example.com/s/200x100/https%3A%2F%2Fimg.example.com"));
//! ```

use super::request::{thumbnail_path_for, CENTERING_PARAM};
use super::security::{sign_source, SIGNATURE_PARAM};
use crate::constants::DEFAULT_ROUTE_PREFIX;
use crate::error::ThumbnailError;

/// Builder for a single thumbnail URL
#[derive(Debug, Clone)]
pub struct ThumbnailUrl {
    base_url: String,
    route_prefix: String,
    source: String,
    width: u32,
    height: u32,
    centering: Option<(f32, f32)>,
    signature_key: Option<String>,
}

impl ThumbnailUrl {
    pub fn new(base_url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            route_prefix: DEFAULT_ROUTE_PREFIX.to_string(),
            source: source.into().trim().to_string(),
            width: 0,
            height: 0,
            centering: None,
            signature_key: None,
        }
    }

    /// Route prefix the service is mounted under (`server.route_prefix`)
    pub fn route_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.route_prefix = prefix.into();
        self
    }

    pub fn dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Crop anchor; both coordinates must lie in [0, 1]
    pub fn centering(mut self, x: f32, y: f32) -> Result<Self, ThumbnailError> {
        if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
            return Err(ThumbnailError::malformed(
                "Only values between 0 and 1 are allowed",
            ));
        }
        self.centering = Some((x, y));
        Ok(self)
    }

    /// Attach `sgn` computed with the given key
    pub fn signed(mut self, key: impl Into<String>) -> Self {
        self.signature_key = Some(key.into());
        self
    }

    pub fn build(&self) -> Result<String, ThumbnailError> {
        self.build_scaled(1)
    }

    /// `<1x url> 1x, <2x url> 2x`
    pub fn srcset(&self) -> Result<String, ThumbnailError> {
        Ok(format!(
            "{} 1x, {} 2x",
            self.build_scaled(1)?,
            self.build_scaled(2)?
        ))
    }

    /// `<img>` tag with `src` pointing at the original and a `srcset`
    pub fn img_tag(&self, attributes: &[(&str, &str)]) -> Result<String, ThumbnailError> {
        let mut parts: Vec<String> = attributes
            .iter()
            .map(|(key, value)| format!("{}=\"{}\"", key, escape_attribute(value)))
            .collect();
        parts.push(format!("src=\"{}\"", escape_attribute(&self.source)));
        parts.push(format!("srcset=\"{}\"", escape_attribute(&self.srcset()?)));

        Ok(format!("<img {}/>", parts.join(" ")))
    }

    fn build_scaled(&self, scale: u32) -> Result<String, ThumbnailError> {
        if self.width == 0 || self.height == 0 {
            return Err(ThumbnailError::malformed("No width and height set"));
        }
        if self.source.is_empty() {
            return Err(ThumbnailError::malformed("Missing source"));
        }

        let width = self.width.saturating_mul(scale);
        let height = self.height.saturating_mul(scale);
        let mut url = self.base_url.clone();
        for segment in self.route_prefix.split('/').filter(|s| !s.is_empty()) {
            url.push('/');
            url.push_str(segment);
        }
        url.push('/');
        url.push_str(&thumbnail_path_for(width, height, &self.source));

        let mut query = Vec::new();
        if let Some(key) = &self.signature_key {
            query.push(format!("{}={}", SIGNATURE_PARAM, sign_source(&self.source, key)));
        }
        if let Some((x, y)) = self.centering {
            query.push(format!("{}={},{}", CENTERING_PARAM, x, y));
        }
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }

        Ok(url)
    }
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LimitsConfig;
    use crate::proxy::helpers::strip_route_prefix;
    use crate::thumbnail::request::parse_request;
    use crate::thumbnail::security::{validate_source, SecurityConfig, ValidationOutcome};
    use std::collections::HashMap;

    const SOURCE: &str = "https://example.com/image one.jpg";

    fn split(url: &str) -> (String, HashMap<String, String>) {
        let rest = url.strip_prefix("https://thumbs.test/s/").unwrap();
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let params = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        (path.to_string(), params)
    }

    #[test]
    fn test_unsigned_url() {
        let url = ThumbnailUrl::new("https://thumbs.test/", SOURCE)
            .dimensions(120, 200)
            .build()
            .unwrap();

        assert_eq!(
            url,
            "https://thumbs.test/s/120x200/https%3A%2F%2Fexample.com%2Fimage%20one.jpg"
        );
    }

    #[test]
    fn test_signed_url_validates_on_server() {
        let url = ThumbnailUrl::new("https://thumbs.test", SOURCE)
            .dimensions(50, 75)
            .centering(0.0, 1.0)
            .unwrap()
            .signed("secret")
            .build()
            .unwrap();

        let (path, query) = split(&url);
        let request = parse_request(&path, &query, &LimitsConfig::default()).unwrap();
        assert_eq!(request.source, SOURCE);
        assert_eq!((request.width, request.height), (50, 75));
        assert_eq!(request.crop_centering, (0.0, 1.0));

        let security = SecurityConfig {
            signature_key: "secret".to_string(),
            known_domains: vec![],
        };
        let outcome =
            validate_source(&request.source, query.get("sgn").map(String::as_str), &security)
                .unwrap();
        assert_eq!(outcome, ValidationOutcome::SignatureMatched);
    }

    #[test]
    fn test_custom_route_prefix_reaches_server_route() {
        let url = ThumbnailUrl::new("https://thumbs.test", "a.com/x.png")
            .route_prefix("/thumbs/")
            .dimensions(40, 30)
            .build()
            .unwrap();
        assert_eq!(url, "https://thumbs.test/thumbs/40x30/a.com%2Fx.png");

        let raw_path = url.strip_prefix("https://thumbs.test").unwrap();
        let path = strip_route_prefix(raw_path, "/thumbs/").unwrap();
        let request = parse_request(path, &HashMap::new(), &LimitsConfig::default()).unwrap();
        assert_eq!(request.source, "a.com/x.png");
        assert_eq!((request.width, request.height), (40, 30));
    }

    #[test]
    fn test_root_route_prefix() {
        let url = ThumbnailUrl::new("https://thumbs.test", "a.com/x.png")
            .route_prefix("/")
            .dimensions(1, 2)
            .build()
            .unwrap();
        assert_eq!(url, "https://thumbs.test/1x2/a.com%2Fx.png");
    }

    #[test]
    fn test_srcset_doubles_dimensions() {
        let srcset = ThumbnailUrl::new("https://thumbs.test", "a.com/x.png")
            .dimensions(50, 75)
            .srcset()
            .unwrap();

        assert_eq!(
            srcset,
            "https://thumbs.test/s/50x75/a.com%2Fx.png 1x, https://thumbs.test/s/100x150/a.com%2Fx.png 2x"
        );
    }

    #[test]
    fn test_img_tag_escapes_attributes() {
        let tag = ThumbnailUrl::new("https://thumbs.test", "a.com/x.png")
            .dimensions(1, 1)
            .img_tag(&[("title", "He said \"hi\"")])
            .unwrap();

        assert!(tag.starts_with("<img title=\"He said &quot;hi&quot;\" src=\"a.com/x.png\" srcset="));
        assert!(tag.ends_with("/>"));
    }

    #[test]
    fn test_missing_dimensions() {
        let err = ThumbnailUrl::new("https://thumbs.test", SOURCE).build().unwrap_err();
        assert_eq!(err.to_string(), "No width and height set");
    }

    #[test]
    fn test_centering_out_of_range() {
        let result = ThumbnailUrl::new("https://thumbs.test", SOURCE).centering(1.5, 0.5);
        assert!(result.is_err());
    }
}
