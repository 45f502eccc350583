//! HTTP request handlers
//!
//! This module implements the API surface:
//! - Account registration and login (token issuance)
//! - Shortening a URL to a fixed-width code (idempotent)
//! - Public redirect from a short code to its original URL
//! - Reverse lookup and listing of mappings
//!
//! Handlers stay thin: shortening logic lives in [`ShortnerService`], token
//! handling in the issuer/validator, and store access in `database`.

use axum::{
    extract::{Extension, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::database::{self, AppState};
use crate::error::AppError;
use crate::middleware::AuthedUser;
use crate::model::{
    LoginRequest, LoginResponse, RegisterRequest, UrlRequest, UrlResponse, User, UserResponse,
};
use crate::password;
use crate::service::ShortnerService;

/// Creates a new account.
///
/// # Response
///
/// - **201 Created** - account created, sanitized user returned
/// - **409 Conflict** - email already registered
///
/// No token is issued here; the client logs in separately.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.username.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(AppError::Validation(
            "username, email and password are required",
        ));
    }

    let user = User {
        id: Uuid::new_v4(),
        username: payload.username,
        email: payload.email,
        password_hash: password::hash_password(&payload.password)?,
        created_at: Utc::now(),
    };

    if !database::insert_user(&state.db, &user)? {
        return Err(AppError::Conflict);
    }

    tracing::info!(email = %user.email, "account registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Exchanges credentials for a signed bearer token.
///
/// Unknown email and wrong password produce the identical generic failure,
/// so the endpoint cannot be used to probe which emails are registered.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user =
        database::get_user(&state.db, &payload.email)?.ok_or(AppError::InvalidCredentials)?;

    if !password::verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let now = Utc::now();
    let issued = state.issuer.issue(&user.id.to_string(), now)?;

    Ok(Json(LoginResponse {
        expires_in: (issued.expires_at - now).num_seconds(),
        token: issued.token,
    }))
}

/// Shortens a URL.
///
/// # Response
///
/// - **201 Created** - mapping for the URL (new or pre-existing; the
///   operation is idempotent per URL)
/// - **400 Bad Request** - empty url
/// - **500** - no free digest window was left (retryable)
pub async fn shorten_url(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Json(payload): Json<UrlRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mapping = ShortnerService::from_state(&state).shorten(&payload.url)?;

    tracing::debug!(user = %user.0, code = %mapping.short_code, "url shortened");

    Ok((
        StatusCode::CREATED,
        Json(UrlResponse::new(&state.base_url, &mapping)),
    ))
}

/// Redirects a short code to its original URL. Public: no token required.
///
/// # Response
///
/// - **302 Found** - `Location` header carries the original URL
/// - **404 Not Found** - unknown code
pub async fn redirect_url(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let original = ShortnerService::from_state(&state).resolve(&code)?;

    Ok((StatusCode::FOUND, [(header::LOCATION, original)]))
}

/// Returns the existing mapping for a URL, or 404 if it was never
/// shortened.
pub async fn find_original(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthedUser>,
    Json(payload): Json<UrlRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mapping = ShortnerService::from_state(&state).reverse_lookup(&payload.url)?;

    Ok(Json(UrlResponse::new(&state.base_url, &mapping)))
}

/// Lists every stored mapping. No pagination; result size is unbounded.
pub async fn list_urls(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthedUser>,
) -> Result<impl IntoResponse, AppError> {
    let mappings = ShortnerService::from_state(&state).list_all()?;

    let body: Vec<UrlResponse> = mappings
        .iter()
        .map(|mapping| UrlResponse::new(&state.base_url, mapping))
        .collect();

    Ok(Json(body))
}
