//! Snake game server
//!
//! Single-player snake over WebSocket, with accounts, points and high scores.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snake_arcade::config::{AppConfig, TICK_DELAY_MS};
use snake_arcade::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snake_arcade=debug,tower_http=debug".into()),
        )
        .init();

    let config = AppConfig::from_env();

    // Create shared state
    let state = Arc::new(AppState::from_config(&config)?);
    info!(
        "Accounts in {:?} mode, game ticks every {}ms",
        state.accounts.mode(),
        TICK_DELAY_MS
    );

    let app = snake_arcade::app(state);

    // Start the server
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🐍 Snake server running on http://{}", addr);
    info!("   WebSocket endpoint: ws://localhost:{}/ws/snake", config.port);

    axum::serve(listener, app).await?;
    Ok(())
}
