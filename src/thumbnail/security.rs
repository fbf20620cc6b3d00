//! Source validation
//!
//! A source is accepted when either:
//! - its domain contains one of the configured allowlist tokens, or
//! - the caller supplied `sgn = hex(md5(percentEncode(source) + key))`
//!
//! Allowlist matching is a substring test: allowlisting `example.com` also
//! trusts `img.example.com.attacker.net`. This is kept for compatibility with
//! URLs minted by existing clients.

use std::sync::OnceLock;

use md5::{Digest, Md5};
use regex::Regex;

use crate::config::Config;
use crate::error::ThumbnailError;

/// Query parameter carrying the source signature
pub const SIGNATURE_PARAM: &str = "sgn";

/// Security configuration for source validation
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Shared secret appended to the escaped source before hashing
    pub signature_key: String,
    /// Domain tokens that bypass signing
    pub known_domains: Vec<String>,
}

impl SecurityConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            signature_key: config.signature_key.clone(),
            known_domains: config.known_domains.clone(),
        }
    }
}

/// Why a source was accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The domain matched this allowlist entry
    TrustedDomain { matched: String },
    /// The supplied signature matched
    SignatureMatched,
}

fn scheme_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^http(s)?:").expect("valid scheme pattern"))
}

/// Percent-encode every byte outside `A-Z a-z 0-9 - . _ ~`
pub fn escape_source(source: &str) -> String {
    urlencoding::encode(source).into_owned()
}

/// Extract the domain segment of a source
///
/// `https://img.example.com/cat.jpg` → `img.example.com` (index 2 skips the
/// empty segment produced by `//`), `img.example.com/cat.jpg` →
/// `img.example.com`.
pub fn source_domain(source: &str) -> &str {
    let segments: Vec<&str> = source.split('/').collect();
    let index = if scheme_pattern().is_match(segments[0]) {
        2
    } else {
        0
    };
    segments.get(index).copied().unwrap_or_default()
}

/// Generate the signature a caller must send to request `source`
///
/// ```text
/// signature = hex(md5(percentEncode(source) + key))
/// ```
pub fn sign_source(source: &str, key: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(escape_source(source).as_bytes());
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Return the first allowlist entry contained in `domain`
pub fn match_known_domain<'a>(domain: &str, known_domains: &'a [String]) -> Option<&'a str> {
    known_domains
        .iter()
        .map(String::as_str)
        .filter(|entry| !entry.is_empty())
        .find(|entry| domain.contains(entry))
}

/// Validate a source against the allowlist, then against its signature
///
/// # Errors
///
/// Returns `AuthenticationFailure` when the domain is not allowlisted and the
/// signature is missing or does not match.
pub fn validate_source(
    source: &str,
    signature: Option<&str>,
    config: &SecurityConfig,
) -> Result<ValidationOutcome, ThumbnailError> {
    let domain = source_domain(source);

    if let Some(matched) = match_known_domain(domain, &config.known_domains) {
        tracing::debug!(domain = %domain, matched = %matched, "Source trusted by domain allowlist");
        return Ok(ValidationOutcome::TrustedDomain {
            matched: matched.to_string(),
        });
    }

    let expected = sign_source(source, &config.signature_key);
    match signature {
        Some(provided) if constant_time_compare(provided, &expected) => {
            Ok(ValidationOutcome::SignatureMatched)
        }
        _ => Err(ThumbnailError::authentication(
            "Failed to validate source file",
        )),
    }
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
