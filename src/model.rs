//! Data models for the URL shortener
//!
//! Storage records (serialized to JSON in redb) and the request/response
//! shapes of the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored short-code → URL mapping.
///
/// Immutable once created: the short code is unique across all live
/// mappings and a URL keeps the first code it was assigned.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UrlMapping {
    /// Fixed-width URL-safe code, e.g. "aB3xK-_9".
    pub short_code: String,

    /// The original long URL.
    pub original_url: String,

    /// When this mapping was first created.
    pub created_at: DateTime<Utc>,
}

/// A registered account, keyed by email in the user table.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: Uuid,

    pub username: String,

    /// Uniquely identifies the account.
    pub email: String,

    /// Argon2id PHC hash string. Never serialized into API responses.
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
}

/// Request payload for `POST /api/auth/register`.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Public view of a [`User`], without the password hash.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Request payload for `POST /api/auth/login`.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for a successful login.
///
/// ```json
/// {
///   "token": "eyJhbGciOi...",
///   "expires_in": 3600
/// }
/// ```
#[derive(Serialize)]
pub struct LoginResponse {
    /// Bearer token to present on authenticated routes.
    pub token: String,

    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// Request payload carrying a long URL, used by both the shorten and the
/// reverse-lookup endpoints.
#[derive(Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

/// API view of a mapping.
///
/// ```json
/// {
///   "original_url": "https://example.com/very/long/url",
///   "short_url": "http://localhost:8080/api/v1/url/aB3xK-_9"
/// }
/// ```
#[derive(Serialize)]
pub struct UrlResponse {
    pub original_url: String,
    pub short_url: String,
}

impl UrlResponse {
    /// Builds the public short URL for a mapping under the configured base.
    pub fn new(base_url: &str, mapping: &UrlMapping) -> Self {
        Self {
            original_url: mapping.original_url.clone(),
            short_url: format!(
                "{}/api/v1/url/{}",
                base_url.trim_end_matches('/'),
                mapping.short_code
            ),
        }
    }
}
