//! Per-session game loop: ticks on a fixed interval, applies client commands
//! between ticks and reports frames back to the presentation layer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::accounts::AccountService;
use crate::config::{MIN_SWIPE_DISTANCE, TICK_DELAY_MS};
use crate::event_logger::EventLogger;
use crate::protocol::{ClientMessage, ServerMessage};

use super::engine::{Game, GameState, TickOutcome};
use super::input::{direction_from_drag, direction_from_key, direction_from_swipe};

/// Who is playing and where results go
#[derive(Clone)]
pub struct SessionContext {
    pub session_id: Uuid,
    /// Account session token, if signed in
    pub token: Option<Uuid>,
    pub accounts: Arc<AccountService>,
    pub event_logger: Arc<EventLogger>,
}

/// Run one game until the command channel closes or the client stops listening.
///
/// The loop owns `game`; ticks and commands are handled one at a time.
pub async fn run_session(
    mut game: Game,
    mut commands: mpsc::Receiver<ClientMessage>,
    out: mpsc::Sender<ServerMessage>,
    ctx: SessionContext,
) {
    let mut tick_interval = interval(Duration::from_millis(TICK_DELAY_MS));
    tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // best score already persisted
    let mut saved_best = game.high_score();

    if out.send(ServerMessage::Frame(game.to_frame())).await.is_err() {
        return;
    }

    loop {
        let reply = tokio::select! {
            _ = tick_interval.tick() => {
                if game.state() != GameState::Running {
                    continue;
                }
                match game.tick() {
                    TickOutcome::Idle => continue,
                    TickOutcome::Moved => {}
                    TickOutcome::Ate { score } => {
                        debug!("Session {} ate food, score {}", ctx.session_id, score);
                        ctx.event_logger.log_food_eaten(ctx.session_id, score, game.snake().head());
                    }
                    TickOutcome::GameOver { cause, score } => {
                        info!("Session {} game over ({:?}), score {}", ctx.session_id, cause, score);
                        ctx.event_logger.log_game_over(
                            ctx.session_id,
                            score,
                            game.snake().len(),
                            game.ticks(),
                            cause,
                        );
                        let new_best = unsaved_best(&game, &mut saved_best);
                        finish_run(&game, new_best, &out, &ctx);

                        let over = ServerMessage::GameOver {
                            score,
                            high_score: game.high_score(),
                            cause,
                        };
                        if out.send(over).await.is_err() {
                            break;
                        }
                    }
                }
                Some(ServerMessage::Frame(game.to_frame()))
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                if matches!(command, ClientMessage::Reset) {
                    if let Some(best) = unsaved_best(&game, &mut saved_best) {
                        save_in_background(best, &ctx);
                    }
                }
                apply_command(&mut game, command, &ctx)
            }
        };

        if let Some(msg) = reply {
            if out.send(msg).await.is_err() {
                break;
            }
        }
    }

    // client left mid-run
    if let Some(best) = unsaved_best(&game, &mut saved_best) {
        ctx.event_logger.log_high_score(ctx.session_id, best);
        ctx.accounts.record_high_score(ctx.token, best).await;
    }
    debug!("Session {} loop finished", ctx.session_id);
}

/// Apply one client command; returns the message to send back, if any
fn apply_command(game: &mut Game, command: ClientMessage, ctx: &SessionContext) -> Option<ServerMessage> {
    let direction = match command {
        ClientMessage::Key { key } => direction_from_key(&key),
        ClientMessage::Swipe { dx, dy } => direction_from_swipe(dx, dy, MIN_SWIPE_DISTANCE),
        ClientMessage::Drag { start, end } => direction_from_drag(start, end),
        ClientMessage::Start => {
            if game.start() {
                info!("Session {} started a run", ctx.session_id);
                ctx.event_logger.log_run_started(ctx.session_id);
            }
            None
        }
        ClientMessage::Pause => {
            let state = game.toggle_pause();
            debug!("Session {} now {:?}", ctx.session_id, state);
            None
        }
        ClientMessage::Reset => {
            game.reset();
            None
        }
        ClientMessage::Ping => return Some(ServerMessage::Pong),
    };

    if let Some(direction) = direction {
        if game.steer(direction) {
            debug!("Session {} direction: {:?}", ctx.session_id, direction);
        }
    }

    Some(ServerMessage::Frame(game.to_frame()))
}

/// The game's best score if it beats `saved_best`; marks it as saved
fn unsaved_best(game: &Game, saved_best: &mut u32) -> Option<u32> {
    let best = game.high_score();
    if best > *saved_best {
        *saved_best = best;
        Some(best)
    } else {
        None
    }
}

fn save_in_background(best: u32, ctx: &SessionContext) {
    ctx.event_logger.log_high_score(ctx.session_id, best);
    let ctx = ctx.clone();
    tokio::spawn(async move {
        ctx.accounts.record_high_score(ctx.token, best).await;
    });
}

/// Persist the high score and credit points in the background
fn finish_run(game: &Game, new_best: Option<u32>, out: &mpsc::Sender<ServerMessage>, ctx: &SessionContext) {
    let score = game.score();
    let played = Duration::from_millis(game.ticks() * TICK_DELAY_MS);

    if let Some(best) = new_best {
        ctx.event_logger.log_high_score(ctx.session_id, best);
    }

    let out = out.clone();
    let ctx = ctx.clone();
    tokio::spawn(async move {
        if let Some(best) = new_best {
            ctx.accounts.record_high_score(ctx.token, best).await;
        }
        if let Some(award) = ctx.accounts.award_points(ctx.token, score, played).await {
            let _ = out
                .send(ServerMessage::Points {
                    earned: award.earned,
                    total: award.total,
                })
                .await;
        }
    });
}
