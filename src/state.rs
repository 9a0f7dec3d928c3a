//! Application state shared across all handlers

use std::sync::Arc;

use tracing::info;

use crate::accounts::{AccountBackend, AccountService, LocalAccounts, RemoteAccounts};
use crate::config::AppConfig;
use crate::error::AccountError;
use crate::event_logger::EventLogger;
use crate::storage::LocalStorage;

/// Shared application state
pub struct AppState {
    /// Account / points layer
    pub accounts: Arc<AccountService>,
    /// Event logger for replay/analysis
    pub event_logger: Arc<EventLogger>,
}

impl AppState {
    /// Build state from runtime config: hosted accounts when configured,
    /// local storage otherwise
    pub fn from_config(config: &AppConfig) -> Result<Self, AccountError> {
        let storage = Arc::new(LocalStorage::open(config.local_storage_path())?);
        let event_logger = Arc::new(EventLogger::new(
            config.enable_event_logging,
            &config.event_log_file,
        ));

        let backend: Arc<dyn AccountBackend> = match &config.remote {
            Some(remote) => {
                info!("Accounts: hosted service at {}", remote.url);
                Arc::new(RemoteAccounts::new(remote.clone())?)
            }
            None => {
                info!("Accounts: hosted service not configured, using local storage (demo mode)");
                Arc::new(LocalAccounts::new(storage.clone()))
            }
        };

        Ok(Self::with_backend(backend, storage, event_logger))
    }

    /// Create with a custom backend (for testing)
    pub fn with_backend(
        backend: Arc<dyn AccountBackend>,
        storage: Arc<LocalStorage>,
        event_logger: Arc<EventLogger>,
    ) -> Self {
        Self {
            accounts: Arc::new(AccountService::new(backend, storage, event_logger.clone())),
            event_logger,
        }
    }

    /// In-memory demo-mode state with event logging off
    pub fn in_memory() -> Self {
        let storage = Arc::new(LocalStorage::in_memory());
        Self::with_backend(
            Arc::new(LocalAccounts::new(storage.clone())),
            storage,
            Arc::new(EventLogger::disabled()),
        )
    }
}
