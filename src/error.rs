//! Crate-wide error taxonomy and HTTP mapping
//!
//! Every fallible path in the application funnels into [`AppError`], which
//! knows how to render itself as a JSON error response. Token validation
//! failures are collapsed into the generic `Unauthorized` variant before
//! they reach a client so the response never reveals which check failed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Request payload failed validation (empty url, missing fields).
    #[error("invalid input: {0}")]
    Validation(&'static str),

    /// Unknown short code or never-shortened URL.
    #[error("not found")]
    NotFound,

    /// Unique constraint hit (registration with a taken email).
    #[error("already exists")]
    Conflict,

    /// Login failed. Covers both unknown email and wrong password so the
    /// response cannot be used for account enumeration.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Bearer token missing or rejected by the validator.
    #[error("unauthorized")]
    Unauthorized,

    /// Every digest window for a URL was already taken by another mapping.
    /// Retryable server-side condition, not a client error.
    #[error("short code windows exhausted")]
    CollisionExhausted,

    /// Underlying store failure. Detail is logged, never returned.
    #[error("storage error")]
    Storage(#[from] redb::Error),

    #[error("internal error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "Bad Request", *msg),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found", "resource not found"),
            AppError::Conflict => (StatusCode::CONFLICT, "Conflict", "already exists"),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "invalid email or password",
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "Invalid or missing bearer token",
            ),
            AppError::CollisionExhausted => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Collision Exhausted",
                "could not allocate a short code, please retry",
            ),
            AppError::Storage(err) => {
                tracing::error!("storage failure: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "internal error",
                )
            }
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "internal error",
            ),
        };

        (
            status,
            Json(json!({
                "error": error,
                "message": message
            })),
        )
            .into_response()
    }
}

// redb reports specific error types per operation; fold them all into the
// umbrella `redb::Error` so `?` works from any store call.
impl From<redb::TransactionError> for AppError {
    fn from(err: redb::TransactionError) -> Self {
        AppError::Storage(err.into())
    }
}

impl From<redb::TableError> for AppError {
    fn from(err: redb::TableError) -> Self {
        AppError::Storage(err.into())
    }
}

impl From<redb::StorageError> for AppError {
    fn from(err: redb::StorageError) -> Self {
        AppError::Storage(err.into())
    }
}

impl From<redb::CommitError> for AppError {
    fn from(err: redb::CommitError) -> Self {
        AppError::Storage(err.into())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("stored record is not valid JSON: {err}");
        AppError::Internal
    }
}
