//! Protocol messages for WebSocket communication

use serde::{Deserialize, Serialize};

use crate::game::engine::{EndCause, GameState};
use crate::game::input::Point;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// A key press, named as `KeyboardEvent.key`
    Key { key: String },
    /// A touch swipe delta in pixels
    Swipe { dx: f64, dy: f64 },
    /// A pointer drag from start to end
    Drag { start: Point, end: Point },
    /// Start button
    Start,
    /// Pause / resume button
    Pause,
    /// Reset button
    Reset,
    /// Keep-alive
    Ping,
}

impl ClientMessage {
    /// Parse a client message from a text frame
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();

        if s == "ping" {
            return Some(ClientMessage::Ping);
        }

        serde_json::from_str(s).ok()
    }
}

/// One board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellData {
    pub x: i32,
    pub y: i32,
}

/// Everything the presentation layer needs to draw one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameData {
    pub state: GameState,
    pub grid: i32,
    pub snake: Vec<CellData>,
    pub food: Option<CellData>,
    pub score: u32,
    pub high_score: u32,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Board snapshot
    Frame(FrameData),
    /// The run has ended
    GameOver {
        score: u32,
        high_score: u32,
        cause: EndCause,
    },
    /// Points credited to the signed-in account
    Points { earned: u64, total: u64 },
    /// Reply to ping
    Pong,
}

impl ServerMessage {
    /// Serialize message to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key() {
        assert_eq!(
            ClientMessage::parse(r#"{"type":"key","key":"ArrowUp"}"#),
            Some(ClientMessage::Key {
                key: "ArrowUp".to_string()
            })
        );
    }

    #[test]
    fn test_parse_buttons_and_ping() {
        assert_eq!(ClientMessage::parse(r#"{"type":"start"}"#), Some(ClientMessage::Start));
        assert_eq!(ClientMessage::parse(r#"{"type":"pause"}"#), Some(ClientMessage::Pause));
        assert_eq!(ClientMessage::parse(" ping "), Some(ClientMessage::Ping));
    }

    #[test]
    fn test_parse_drag() {
        let msg = ClientMessage::parse(
            r#"{"type":"drag","start":{"x":1,"y":2},"end":{"x":80,"y":2}}"#,
        );
        assert!(matches!(msg, Some(ClientMessage::Drag { .. })));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(ClientMessage::parse("north"), None);
        assert_eq!(ClientMessage::parse(r#"{"type":"fly"}"#), None);
    }

    #[test]
    fn test_server_message_json() {
        assert_eq!(ServerMessage::Pong.to_json(), r#"{"type":"pong"}"#);

        let msg = ServerMessage::GameOver {
            score: 30,
            high_score: 50,
            cause: EndCause::SelfBite,
        };
        assert_eq!(
            msg.to_json(),
            r#"{"type":"game_over","score":30,"high_score":50,"cause":"self_bite"}"#
        );
    }

    #[test]
    fn test_frame_json_is_flat() {
        let msg = ServerMessage::Frame(FrameData {
            state: GameState::Running,
            grid: 20,
            snake: vec![CellData { x: 1, y: 2 }],
            food: None,
            score: 0,
            high_score: 0,
        });
        let json = msg.to_json();
        assert!(json.starts_with(r#"{"type":"frame","state":"running""#));
    }
}
