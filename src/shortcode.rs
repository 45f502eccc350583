//! Deterministic short code derivation
//!
//! A short code is an 8-character window of the URL-safe base64 encoding of
//! the SHA-256 digest of the original URL. The `attempt` argument selects
//! which window to use: attempt 0 takes characters 0..8, attempt 1 takes
//! 8..16, and so on. Because the digest is a pure function of the URL, the
//! whole derivation is deterministic and reproducible, which is what makes
//! retries and idempotent shortening possible.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Width of every short code.
pub const CODE_LEN: usize = 8;

/// A 32-byte SHA-256 digest encodes to 43 base64 characters, which holds
/// five full 8-character windows. Past that the generator is exhausted and
/// the caller must give up rather than loop.
pub const MAX_OFFSETS: usize = 43 / CODE_LEN;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodeError {
    /// The requested window starts past the end of the encoded digest.
    #[error("digest windows exhausted at attempt {0}")]
    Exhausted(usize),
}

/// Derives the candidate short code for `url` at the given attempt offset.
///
/// Pure function: no randomness, no IO. The same `(url, attempt)` pair
/// always yields the same code.
pub fn generate(url: &str, attempt: usize) -> Result<String, CodeError> {
    let digest = Sha256::digest(url.as_bytes());
    let encoded = URL_SAFE_NO_PAD.encode(digest);

    let start = attempt * CODE_LEN;
    let end = start + CODE_LEN;
    if end > encoded.len() {
        return Err(CodeError::Exhausted(attempt));
    }

    // base64 output is pure ASCII, so byte slicing is char slicing.
    Ok(encoded[start..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_is_deterministic() {
        let a = generate("https://example.com/a", 0).unwrap();
        let b = generate("https://example.com/a", 0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn generate_produces_fixed_width_codes() {
        for attempt in 0..MAX_OFFSETS {
            let code = generate("https://example.com/some/long/path?q=1", attempt).unwrap();
            assert_eq!(code.len(), CODE_LEN);
        }
    }

    #[test]
    fn codes_are_url_safe() {
        let code = generate("https://example.com/π/ünïcode", 0).unwrap();
        assert!(code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn attempts_select_distinct_windows() {
        let url = "https://example.com/windows";
        let first = generate(url, 0).unwrap();
        let second = generate(url, 1).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn different_urls_differ_at_attempt_zero() {
        let a = generate("https://example.com/a", 0).unwrap();
        let b = generate("https://example.com/b", 0).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn generate_fails_past_last_window() {
        assert_eq!(
            generate("https://example.com", MAX_OFFSETS),
            Err(CodeError::Exhausted(MAX_OFFSETS))
        );
    }
}
