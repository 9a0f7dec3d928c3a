//! Game event journal (JSON lines) for replay and analysis

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::game::engine::EndCause;
use crate::game::location::Location;

/// Types of game events that can be logged
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// A run began
    RunStarted { session_id: Uuid },
    /// Snake ate food
    FoodEaten {
        session_id: Uuid,
        score: u32,
        location: LocationData,
    },
    /// A run ended
    GameOver {
        session_id: Uuid,
        score: u32,
        length: usize,
        ticks: u64,
        cause: EndCause,
    },
    /// A run beat the previous best
    NewHighScore { session_id: Uuid, score: u32 },
    /// Points credited to an account
    PointsAwarded {
        user_id: String,
        earned: u64,
        total: u64,
    },
    Registered { user_id: String, username: String },
    SignedIn { user_id: String, username: String },
    SignedOut { user_id: String },
}

/// Location data for serialization
#[derive(Debug, Clone, Serialize)]
pub struct LocationData {
    pub x: i32,
    pub y: i32,
}

impl From<Location> for LocationData {
    fn from(loc: Location) -> Self {
        Self { x: loc.x, y: loc.y }
    }
}

/// Logged event with timestamp
#[derive(Debug, Serialize)]
struct LogEntry {
    /// Unix timestamp in milliseconds
    timestamp_ms: u128,
    /// The event data
    #[serde(flatten)]
    event: GameEvent,
}

/// Game event logger
pub struct EventLogger {
    /// File writer (None if logging disabled)
    writer: Option<Mutex<BufWriter<File>>>,
}

impl EventLogger {
    /// Open the journal at `path`, or a disabled logger when `enabled` is false
    pub fn new(enabled: bool, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !enabled {
            info!("Event logging is disabled");
            return Self::disabled();
        }

        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                info!("Event logging enabled, writing to {}", path.display());
                Self {
                    writer: Some(Mutex::new(BufWriter::new(file))),
                }
            }
            Err(e) => {
                error!("Failed to open event log file: {}", e);
                Self::disabled()
            }
        }
    }

    /// Logger that drops everything
    pub fn disabled() -> Self {
        Self { writer: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Log a game event
    pub fn log(&self, event: GameEvent) {
        let Some(ref writer) = self.writer else {
            return;
        };

        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);

        let entry = LogEntry { timestamp_ms, event };

        if let Ok(mut w) = writer.lock() {
            if let Ok(json) = serde_json::to_string(&entry) {
                let _ = writeln!(w, "{}", json);
                let _ = w.flush();
            }
        }
    }

    pub fn log_run_started(&self, session_id: Uuid) {
        self.log(GameEvent::RunStarted { session_id });
    }

    pub fn log_food_eaten(&self, session_id: Uuid, score: u32, location: Location) {
        self.log(GameEvent::FoodEaten {
            session_id,
            score,
            location: location.into(),
        });
    }

    pub fn log_game_over(&self, session_id: Uuid, score: u32, length: usize, ticks: u64, cause: EndCause) {
        self.log(GameEvent::GameOver {
            session_id,
            score,
            length,
            ticks,
            cause,
        });
    }

    pub fn log_high_score(&self, session_id: Uuid, score: u32) {
        self.log(GameEvent::NewHighScore { session_id, score });
    }

    pub fn log_points(&self, user_id: &str, earned: u64, total: u64) {
        self.log(GameEvent::PointsAwarded {
            user_id: user_id.to_string(),
            earned,
            total,
        });
    }

    pub fn log_register(&self, user_id: &str, username: &str) {
        self.log(GameEvent::Registered {
            user_id: user_id.to_string(),
            username: username.to_string(),
        });
    }

    pub fn log_sign_in(&self, user_id: &str, username: &str) {
        self.log(GameEvent::SignedIn {
            user_id: user_id.to_string(),
            username: username.to_string(),
        });
    }

    pub fn log_sign_out(&self, user_id: &str) {
        self.log(GameEvent::SignedOut {
            user_id: user_id.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = GameEvent::FoodEaten {
            session_id: Uuid::nil(),
            score: 20,
            location: LocationData { x: 3, y: 4 },
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event":"food_eaten""#));
        assert!(json.contains(r#""score":20"#));
    }

    #[test]
    fn test_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");

        let logger = EventLogger::new(true, &path);
        assert!(logger.is_enabled());
        logger.log_run_started(Uuid::nil());
        logger.log_game_over(Uuid::nil(), 30, 4, 12, EndCause::Wall);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains(r#""cause":"wall""#));
        assert!(lines[0].contains("timestamp_ms"));
    }

    #[test]
    fn test_disabled_logger_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");

        let logger = EventLogger::new(false, &path);
        logger.log_run_started(Uuid::nil());
        assert!(!path.exists());
    }
}
