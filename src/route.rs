//! Route definitions
//!
//! Maps the HTTP surface onto handlers and wires the auth gate around the
//! protected routes. The redirect endpoint is registered after the gate
//! layer so short-code resolution stays public.

use axum::routing::{get, post};
use axum::Router;

use axum::middleware;

use crate::database::AppState;
use crate::handler::{find_original, list_urls, login, redirect_url, register, shorten_url};
use crate::middleware::auth_gate;

/// Creates and configures the application router.
///
/// # Route Definitions
///
/// - `POST /api/auth/register` - create an account (public)
/// - `POST /api/auth/login` - exchange credentials for a token (public)
/// - `POST /api/v1/url` - shorten a URL (bearer token required)
/// - `GET /api/v1/url` - list all mappings (bearer token required)
/// - `GET /api/v1/url/original` - reverse lookup by URL (bearer token required)
/// - `GET /api/v1/url/{code}` - redirect to the original URL (public)
pub fn create_app(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));

    // Routes added before the layer call are gated; the redirect route is
    // added after it and stays public.
    let url_routes = Router::new()
        .route("/url", post(shorten_url).get(list_urls))
        .route("/url/original", get(find_original))
        .layer(middleware::from_fn_with_state(state.clone(), auth_gate))
        .route("/url/{code}", get(redirect_url));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/v1", url_routes)
        .with_state(state)
}
