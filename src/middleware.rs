//! Per-request authentication gate
//!
//! Protected routes are wrapped in [`auth_gate`]: it pulls the bearer token
//! out of the `Authorization` header, hands it to the token validator, and
//! only lets the request through once an identity is established. Every
//! failure mode (missing header, bad scheme, bad signature, expired,
//! malformed) produces the same generic 401 body; the specific reason is
//! only logged.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::database::AppState;
use crate::error::AppError;

/// Identity attached to the request once the gate has validated the token.
#[derive(Clone)]
pub struct AuthedUser(pub String);

pub async fn auth_gate(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(token) = token else {
        return Err(AppError::Unauthorized.into_response());
    };

    match state.validator.validate(token, Utc::now()) {
        Ok(identity) => {
            request.extensions_mut().insert(AuthedUser(identity));
            Ok(next.run(request).await)
        }
        Err(err) => {
            tracing::debug!("bearer token rejected: {err}");
            Err(AppError::Unauthorized.into_response())
        }
    }
}
