//! Game configuration constants and runtime settings

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Board side length in cells (the board is square)
pub const GRID_TILES: i32 = 20;

/// Size of one cell in canvas pixels
pub const CELL_PIXELS: i32 = 20;

/// Starting cell of the snake head
pub const START_X: i32 = 10;
pub const START_Y: i32 = 10;

/// Game tick delay in milliseconds
pub const TICK_DELAY_MS: u64 = 150;

/// Score added for each food eaten
pub const FOOD_SCORE: u32 = 10;

/// Minimum swipe / drag length in pixels before it counts as a gesture
pub const MIN_SWIPE_DISTANCE: f64 = 30.0;

/// Outbound message queue per session
pub const SESSION_CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// Accounts / Points
// =============================================================================

/// Points granted to every new account
pub const SIGNUP_BONUS_POINTS: u64 = 100;

/// Points per unit of score at game over
pub const POINTS_PER_FOOD: u64 = 10;

/// Runs longer than this earn the bonus multiplier
pub const BONUS_AFTER_SECS: u64 = 60;

/// Multiplier for long runs
pub const BONUS_MULTIPLIER: f64 = 1.5;

/// Timeout for calls to the hosted auth/table service
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Profile table on the hosted service
pub const PROFILE_TABLE: &str = "user_profiles";

/// Local storage keys
pub const HIGH_SCORE_KEY: &str = "snakeHighScore";
pub const USERS_KEY: &str = "demo_users";
pub const CURRENT_USER_KEY: &str = "demo_current_user";

/// Local storage file name inside the data directory
pub const LOCAL_STORAGE_FILE: &str = "local_storage.json";

/// Placeholders shipped in config templates; treated as "not configured"
const URL_PLACEHOLDER: &str = "YOUR_SUPABASE_URL_HERE";
const KEY_PLACEHOLDER: &str = "YOUR_SUPABASE_ANON_KEY_HERE";

// =============================================================================
// Event Logging
// =============================================================================

/// Default game event log file
pub const EVENT_LOG_FILE: &str = "game_events.log";

/// Credentials for the hosted auth/table service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub url: String,
    pub anon_key: String,
}

/// Runtime configuration, read from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub remote: Option<RemoteConfig>,
    pub enable_event_logging: bool,
    pub event_log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            data_dir: PathBuf::from("data"),
            remote: None,
            enable_event_logging: true,
            event_log_file: PathBuf::from(EVENT_LOG_FILE),
        }
    }
}

impl AppConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            remote: remote_config(
                env::var("SUPABASE_URL").ok(),
                env::var("SUPABASE_ANON_KEY").ok(),
            ),
            enable_event_logging: env::var("ENABLE_EVENT_LOGGING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.enable_event_logging),
            event_log_file: env::var("EVENT_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.event_log_file),
        }
    }

    /// Full bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Path of the local storage file
    pub fn local_storage_path(&self) -> PathBuf {
        self.data_dir.join(LOCAL_STORAGE_FILE)
    }
}

/// Build the hosted service config, if both values are present and filled in
pub fn remote_config(url: Option<String>, anon_key: Option<String>) -> Option<RemoteConfig> {
    let url = url?.trim().trim_end_matches('/').to_string();
    let anon_key = anon_key?.trim().to_string();

    if url.is_empty() || anon_key.is_empty() || url == URL_PLACEHOLDER || anon_key == KEY_PLACEHOLDER {
        return None;
    }

    Some(RemoteConfig { url, anon_key })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert!(config.remote.is_none());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_remote_config_requires_both_values() {
        assert!(remote_config(Some("https://x.supabase.co".into()), None).is_none());
        assert!(remote_config(None, Some("key".into())).is_none());
        assert!(remote_config(Some("".into()), Some("key".into())).is_none());
    }

    #[test]
    fn test_remote_config_rejects_placeholders() {
        assert!(remote_config(Some(URL_PLACEHOLDER.into()), Some("key".into())).is_none());
        assert!(remote_config(Some("https://x.supabase.co".into()), Some(KEY_PLACEHOLDER.into())).is_none());
    }

    #[test]
    fn test_remote_config_trims_trailing_slash() {
        let remote = remote_config(Some("https://x.supabase.co/".into()), Some("key".into())).unwrap();
        assert_eq!(remote.url, "https://x.supabase.co");
    }
}
