//! Account / points layer
//!
//! A thin client over either a hosted auth + table service or a local
//! key-value substitute. Both sit behind [`AccountBackend`]; the
//! [`AccountService`] adds form validation, session tokens and turns every
//! outcome into an [`AccountResponse`].

pub mod local;
pub mod points;
pub mod remote;
pub mod service;
pub mod validation;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AccountError;

pub use local::LocalAccounts;
pub use points::PointsCalculator;
pub use remote::RemoteAccounts;
pub use service::{AccountResponse, AccountService, PointsAward};

/// Which backend is serving accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Hosted auth + table service
    Remote,
    /// Local storage ("demo mode")
    Local,
}

/// The profile row for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub points: u64,
    #[serde(default)]
    pub high_score: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Credentials a backend hands back on sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    /// Bearer token for the hosted service (local sessions have none)
    pub access_token: Option<String>,
}

/// Registration form as submitted
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Login form; the identifier is a username or an email
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default, alias = "username", alias = "email")]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
}

/// Storage for users and their profiles
#[async_trait]
pub trait AccountBackend: Send + Sync {
    fn mode(&self) -> BackendMode;

    /// Create the identity and its profile row
    async fn sign_up(&self, form: &RegisterForm) -> Result<(Session, UserProfile), AccountError>;

    /// Authenticate and load the profile
    async fn sign_in(&self, identifier: &str, password: &str)
        -> Result<(Session, UserProfile), AccountError>;

    async fn sign_out(&self, session: &Session) -> Result<(), AccountError>;

    async fn load_profile(&self, session: &Session) -> Result<UserProfile, AccountError>;

    /// Overwrite the point total
    async fn update_points(&self, session: &Session, total: u64) -> Result<(), AccountError>;

    async fn update_high_score(&self, session: &Session, score: u32) -> Result<(), AccountError>;
}
