//! JSON endpoints for the account / points layer

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::accounts::{AccountResponse, BackendMode, LoginForm, RegisterForm};
use crate::config::{CELL_PIXELS, GRID_TILES, MIN_SWIPE_DISTANCE, TICK_DELAY_MS};
use crate::state::AppState;

/// Header carrying the session token
pub const SESSION_HEADER: &str = "x-session-token";

/// Client-side settings
#[derive(Debug, Serialize)]
pub struct ClientConfig {
    pub mode: BackendMode,
    pub grid_tiles: i32,
    pub cell_pixels: i32,
    pub tick_ms: u64,
    pub min_swipe_distance: f64,
}

fn session_token(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
}

pub async fn config_handler(State(state): State<Arc<AppState>>) -> Json<ClientConfig> {
    Json(ClientConfig {
        mode: state.accounts.mode(),
        grid_tiles: GRID_TILES,
        cell_pixels: CELL_PIXELS,
        tick_ms: TICK_DELAY_MS,
        min_swipe_distance: MIN_SWIPE_DISTANCE,
    })
}

/// Malformed or missing JSON bodies answer like any other failed call
fn rejected(rejection: JsonRejection) -> Json<AccountResponse> {
    debug!("Rejected request body: {}", rejection);
    Json(AccountResponse::rejected(rejection.body_text()))
}

pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    form: Result<Json<RegisterForm>, JsonRejection>,
) -> Json<AccountResponse> {
    match form {
        Ok(Json(form)) => Json(state.accounts.register(&form).await),
        Err(rejection) => rejected(rejection),
    }
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    form: Result<Json<LoginForm>, JsonRejection>,
) -> Json<AccountResponse> {
    match form {
        Ok(Json(form)) => Json(state.accounts.login(&form).await),
        Err(rejection) => rejected(rejection),
    }
}

pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<AccountResponse> {
    Json(state.accounts.logout(session_token(&headers)).await)
}

pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<AccountResponse> {
    Json(state.accounts.current_user(session_token(&headers)).await)
}
