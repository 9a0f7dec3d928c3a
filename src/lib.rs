//! Snake game server with accounts
//!
//! Each browser session plays its own game over a WebSocket; the server runs
//! the simulation and the browser draws frames. An account layer (hosted
//! auth/table service, or local storage in demo mode) tracks points and high
//! scores.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use rust_embed::Embed;
use tower_http::cors::{Any, CorsLayer};

pub mod accounts;
pub mod api;
pub mod config;
pub mod error;
pub mod event_logger;
pub mod game;
pub mod protocol;
pub mod state;
pub mod storage;
pub mod ws;

use state::AppState;
use ws::ws_handler;

/// Embedded static files
#[derive(Embed)]
#[folder = "static/"]
struct Assets;

/// Serve embedded static files
async fn serve_static(path: &str) -> impl IntoResponse {
    let path = if path.is_empty() { "index.html" } else { path };

    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                StatusCode::OK,
                [("content-type", mime.as_ref())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

/// Index page handler
async fn index_handler() -> impl IntoResponse {
    serve_static("index.html").await
}

/// Static file handler
async fn static_handler(
    axum::extract::Path(path): axum::extract::Path<String>,
) -> impl IntoResponse {
    serve_static(&path).await
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// Build the router
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/ws/snake", get(ws_handler))
        .route("/health", get(health_handler))
        .route("/api/config", get(api::config_handler))
        .route("/api/register", post(api::register_handler))
        .route("/api/login", post(api::login_handler))
        .route("/api/logout", post(api::logout_handler))
        .route("/api/me", get(api::me_handler))
        .route("/{*path}", get(static_handler))
        .layer(cors)
        .with_state(state)
}
