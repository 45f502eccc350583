//! Stateless authentication tokens
//!
//! Tokens are compact HS256-signed JWTs over `{sub, iat, exp}`. The server
//! keeps no session state: validity is recomputed from the signature and the
//! clock on every request, so any number of instances can validate tokens as
//! long as they share the signing secret. Both the issuer and the validator
//! take the current time as an argument, which keeps them pure and directly
//! testable.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;

/// Claims embedded in every issued token. The signature covers all three
/// fields, so none can be altered independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the authenticated user id.
    pub sub: String,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// Why a presented token was rejected. Never returned to clients directly;
/// the auth gate collapses all variants into one generic 401.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature mismatch")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
}

/// A freshly signed token together with its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Creates signed, time-bounded tokens for authenticated identities.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    /// Signs `{sub: identity, iat: now, exp: now + ttl}`.
    pub fn issue(&self, identity: &str, now: DateTime<Utc>) -> Result<IssuedToken, AppError> {
        let expires_at = now + Duration::seconds(self.ttl_secs);
        let claims = Claims {
            sub: identity.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key).map_err(|err| {
            tracing::error!("failed to sign token: {err}");
            AppError::Internal
        })?;

        Ok(IssuedToken { token, expires_at })
    }
}

/// Verifies presented tokens and extracts the embedded identity.
#[derive(Clone)]
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller-supplied clock in validate(),
        // not against the library's view of wall time.
        validation.validate_exp = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Checks signature then expiry, and returns the subject on success.
    /// No store lookup happens here; the token is the whole credential.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            },
        )?;

        if now.timestamp() > data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims.sub)
    }
}
