//! Application entry point and server initialization
//!
//! Loads environment configuration, initializes the embedded database and
//! the signing secret, and starts the HTTP server with graceful shutdown
//! support.

use std::env;
use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

// Module declarations
mod database;
mod error;
mod handler;
mod middleware;
mod model;
mod password;
mod route;
mod service;
mod shortcode;
mod token;

use database::{init_db, AppConfig, AppState};
use route::create_app;

/// Application entry point
///
/// # Environment Variables
///
/// - `PORT` - Server port number (default: 8080)
/// - `DATABASE_URL` - Path to the database file (default: "data.db")
/// - `BASE_URL` - Public base for advertised short URLs
///   (default: "http://localhost:{PORT}")
/// - `TOKEN_SECRET` - Secret for signing bearer tokens. Falls back to an
///   insecure development value with a warning; always set it in production.
/// - `TOKEN_TTL_SECS` - Token lifetime in seconds (default: 3600)
/// - `COLLISION_RETRY_LIMIT` - Max collision-retry attempts per URL
///   (default: every available digest window)
#[tokio::main]
async fn main() {
    // Load environment variables from .env file if it exists
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter("linkcut=debug,tower_http=debug")
        .init();

    let port_str = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let port: u16 = port_str.parse().unwrap_or(8080);

    let db_name = env::var("DATABASE_URL").unwrap_or_else(|_| "data.db".to_string());

    let token_secret = env::var("TOKEN_SECRET").unwrap_or_else(|_| {
        tracing::warn!("TOKEN_SECRET not set, using an insecure development secret");
        "insecure-dev-secret".to_string()
    });

    let token_ttl_secs = env::var("TOKEN_TTL_SECS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(3600);

    let retry_limit = env::var("COLLISION_RETRY_LIMIT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(shortcode::MAX_OFFSETS);

    let base_url =
        env::var("BASE_URL").unwrap_or_else(|_| format!("http://localhost:{}", port));

    // Initialize the embedded database with the specified path
    let db = init_db(&db_name).expect("Failed to initialize database");

    let state = AppState::new(
        Arc::new(db),
        AppConfig {
            base_url,
            token_secret,
            token_ttl_secs,
            retry_limit,
        },
    );

    let app = create_app(state).layer(TraceLayer::new_for_http());

    // Bind to all network interfaces on the specified port
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await.unwrap();

    println!("🚀 Server running at http://localhost:{}", port);
    println!("📂 Using database: {}", db_name);

    // The server keeps running until it receives SIGTERM or SIGINT
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

/// Waits for a shutdown signal
///
/// Returns when SIGINT (Ctrl+C) or, on Unix, SIGTERM is received, which
/// triggers graceful server shutdown: open connections are allowed to
/// complete and the database is closed cleanly.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    println!("\n🛑 Shutdown signal received, stopping server.");
}
