//! WebSocket handler for client connections

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::SESSION_CHANNEL_CAPACITY;
use crate::game::game_loop::{run_session, SessionContext};
use crate::game::Game;
use crate::protocol::ClientMessage;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    /// Account session token from `/api/login`
    pub token: Option<Uuid>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.token))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, token: Option<Uuid>) {
    let session_id = Uuid::new_v4();
    let signed_in = state.accounts.current_user(token).await;
    let token = token.filter(|_| signed_in.success);

    info!(
        "Session {} connected ({})",
        session_id,
        signed_in
            .user
            .as_ref()
            .map(|u| u.username.as_str())
            .unwrap_or("guest")
    );

    let game = Game::new(state.accounts.high_score_for(token));
    let ctx = SessionContext {
        session_id,
        token,
        accounts: state.accounts.clone(),
        event_logger: state.event_logger.clone(),
    };

    let (cmd_tx, cmd_rx) = mpsc::channel::<ClientMessage>(SESSION_CHANNEL_CAPACITY);
    let (out_tx, mut out_rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);

    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    let session_task = tokio::spawn(run_session(game, cmd_rx, out_tx, ctx));

    // Task to send game messages to this client
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if sender.send(Message::Text(msg.to_json().into())).await.is_err() {
                break;
            }
        }
    });

    // Task to receive commands from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => match ClientMessage::parse(&text) {
                    Some(msg) => {
                        if cmd_tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                    None => debug!("Session {} sent an unknown message: {}", session_id, text.as_str()),
                },
                Ok(Message::Close(_)) => {
                    info!("Session {} sent close frame", session_id);
                    break;
                }
                Ok(_) => {
                    // Ignore binary, ping, pong frames
                }
                Err(e) => {
                    error!("WebSocket error for session {}: {}", session_id, e);
                    break;
                }
            }
        }
    });

    // Wait for either side to finish; dropping the command sender ends the game loop
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => {}
    }

    if let Err(e) = session_task.await {
        error!("Game loop for session {} failed: {}", session_id, e);
    }
    send_task.abort();

    info!("Session {} disconnected", session_id);
}
