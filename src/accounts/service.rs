//! Account sessions and the success-flag-plus-message surface

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::validation::{validate_login, validate_registration};
use super::{
    AccountBackend, BackendMode, LoginForm, PointsCalculator, RegisterForm, Session, UserProfile,
};
use crate::config::HIGH_SCORE_KEY;
use crate::error::AccountError;
use crate::event_logger::EventLogger;
use crate::storage::LocalStorage;

/// What every account call hands back to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<Uuid>,
}

impl AccountResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            user: None,
            token: None,
        }
    }

    /// Failure with a plain message, e.g. for a request body that did not parse
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            user: None,
            token: None,
        }
    }

    fn failed(error: &AccountError) -> Self {
        Self::rejected(error.to_string())
    }

    fn with_user(mut self, user: UserProfile, token: Uuid) -> Self {
        self.user = Some(user);
        self.token = Some(token);
        self
    }
}

/// Points credited at the end of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsAward {
    pub earned: u64,
    pub total: u64,
}

/// A signed-in user: backend credentials plus the mirrored profile
#[derive(Debug, Clone)]
struct SignedIn {
    session: Session,
    profile: UserProfile,
}

pub struct AccountService {
    backend: Arc<dyn AccountBackend>,
    /// Signed-in users, keyed by session token
    sessions: DashMap<Uuid, SignedIn>,
    /// Holds the guest high score
    storage: Arc<LocalStorage>,
    points: PointsCalculator,
    event_logger: Arc<EventLogger>,
}

impl AccountService {
    pub fn new(
        backend: Arc<dyn AccountBackend>,
        storage: Arc<LocalStorage>,
        event_logger: Arc<EventLogger>,
    ) -> Self {
        Self {
            backend,
            sessions: DashMap::new(),
            storage,
            points: PointsCalculator::default(),
            event_logger,
        }
    }

    pub fn mode(&self) -> BackendMode {
        self.backend.mode()
    }

    /// Number of signed-in sessions
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub async fn register(&self, form: &RegisterForm) -> AccountResponse {
        match self.try_register(form).await {
            Ok((session, profile)) => {
                info!("Registered {}", profile.username);
                self.event_logger.log_register(&profile.id, &profile.username);

                let message = match self.mode() {
                    BackendMode::Local => format!(
                        "Registration successful! {} bonus points granted",
                        profile.points
                    ),
                    BackendMode::Remote => {
                        "Registration successful! Please check your email for the verification link."
                            .to_string()
                    }
                };
                let token = self.open_session(session, profile.clone());
                AccountResponse::ok(message).with_user(profile, token)
            }
            Err(e) => {
                debug!("Registration failed: {}", e);
                AccountResponse::failed(&e)
            }
        }
    }

    pub async fn login(&self, form: &LoginForm) -> AccountResponse {
        match self.try_login(form).await {
            Ok((session, profile)) => {
                info!("{} signed in", profile.username);
                self.event_logger.log_sign_in(&profile.id, &profile.username);

                let token = self.open_session(session, profile.clone());
                AccountResponse::ok("Login successful!").with_user(profile, token)
            }
            Err(e) => {
                debug!("Login failed: {}", e);
                AccountResponse::failed(&e)
            }
        }
    }

    pub async fn logout(&self, token: Option<Uuid>) -> AccountResponse {
        let Some((_, signed_in)) = token.and_then(|t| self.sessions.remove(&t)) else {
            return AccountResponse::failed(&AccountError::NotSignedIn);
        };

        self.event_logger.log_sign_out(&signed_in.profile.id);

        match self.backend.sign_out(&signed_in.session).await {
            Ok(()) => AccountResponse::ok("Signed out"),
            Err(e) => {
                warn!("Sign-out for {} failed: {}", signed_in.profile.username, e);
                AccountResponse::failed(&e)
            }
        }
    }

    /// Current profile for a token, refreshed from the backend when possible
    pub async fn current_user(&self, token: Option<Uuid>) -> AccountResponse {
        let (Some(token), Some(signed_in)) = (token, self.signed_in(token)) else {
            return AccountResponse::failed(&AccountError::NotSignedIn);
        };

        let profile = match self.backend.load_profile(&signed_in.session).await {
            Ok(profile) => {
                if let Some(mut entry) = self.sessions.get_mut(&token) {
                    entry.profile = profile.clone();
                }
                profile
            }
            Err(e) => {
                warn!("Profile refresh failed, using cached copy: {}", e);
                signed_in.profile
            }
        };

        AccountResponse::ok("OK").with_user(profile, token)
    }

    /// Best score to start a game with: the profile's, or the guest record
    pub fn high_score_for(&self, token: Option<Uuid>) -> u32 {
        match self.signed_in(token) {
            Some(signed_in) => signed_in.profile.high_score,
            None => self.guest_high_score(),
        }
    }

    pub fn guest_high_score(&self) -> u32 {
        self.storage
            .get_item(HIGH_SCORE_KEY)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Save a high score if it beats the stored one. Errors are logged, not returned.
    pub async fn record_high_score(&self, token: Option<Uuid>, high_score: u32) {
        let Some(signed_in) = self.signed_in(token) else {
            if high_score > self.guest_high_score() {
                if let Err(e) = self.storage.set_item(HIGH_SCORE_KEY, high_score.to_string()) {
                    warn!("Failed to save high score: {}", e);
                }
            }
            return;
        };

        if high_score <= signed_in.profile.high_score {
            return;
        }

        match self.backend.update_high_score(&signed_in.session, high_score).await {
            Ok(()) => {
                if let Some(mut entry) = token.and_then(|t| self.sessions.get_mut(&t)) {
                    entry.profile.high_score = entry.profile.high_score.max(high_score);
                }
            }
            Err(e) => warn!("Failed to update high score for {}: {}", signed_in.profile.username, e),
        }
    }

    /// Credit points for a finished run. Guests earn nothing.
    pub async fn award_points(&self, token: Option<Uuid>, score: u32, played: Duration) -> Option<PointsAward> {
        let signed_in = self.signed_in(token)?;
        let earned = self.points.calculate(score, played);
        let total = signed_in.profile.points + earned;

        if let Err(e) = self.backend.update_points(&signed_in.session, total).await {
            warn!("Failed to update points for {}: {}", signed_in.profile.username, e);
            return None;
        }

        if let Some(mut entry) = token.and_then(|t| self.sessions.get_mut(&t)) {
            entry.profile.points = total;
        }
        self.event_logger.log_points(&signed_in.profile.id, earned, total);

        Some(PointsAward { earned, total })
    }

    async fn try_register(&self, form: &RegisterForm) -> Result<(Session, UserProfile), AccountError> {
        validate_registration(form)?;
        self.backend.sign_up(form).await
    }

    async fn try_login(&self, form: &LoginForm) -> Result<(Session, UserProfile), AccountError> {
        validate_login(form)?;
        self.backend.sign_in(&form.identifier, &form.password).await
    }

    fn open_session(&self, session: Session, profile: UserProfile) -> Uuid {
        let token = Uuid::new_v4();
        self.sessions.insert(token, SignedIn { session, profile });
        token
    }

    /// Cloned out so no map guard lives across an await
    fn signed_in(&self, token: Option<Uuid>) -> Option<SignedIn> {
        self.sessions.get(&token?).map(|entry| entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::LocalAccounts;

    fn service() -> AccountService {
        let storage = Arc::new(LocalStorage::in_memory());
        AccountService::new(
            Arc::new(LocalAccounts::new(storage.clone())),
            storage,
            Arc::new(EventLogger::disabled()),
        )
    }

    fn register_form(username: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_signs_in() {
        let service = service();
        let response = service.register(&register_form("alice")).await;

        assert!(response.success);
        assert!(response.message.contains("100 bonus points"));
        assert!(response.token.is_some());
        assert_eq!(response.user.unwrap().points, 100);
        assert_eq!(service.session_count(), 1);
    }

    #[tokio::test]
    async fn test_validation_failure_is_a_message() {
        let service = service();
        let mut form = register_form("alice");
        form.confirm_password = "different".to_string();

        let response = service.register(&form).await;
        assert!(!response.success);
        assert_eq!(response.message, "Passwords do not match");
        assert!(response.token.is_none());
    }

    #[tokio::test]
    async fn test_login_logout() {
        let service = service();
        service.register(&register_form("alice")).await;

        let bad = service
            .login(&LoginForm {
                identifier: "alice".to_string(),
                password: "nope123".to_string(),
            })
            .await;
        assert!(!bad.success);
        assert_eq!(bad.message, "Invalid username or password");

        let good = service
            .login(&LoginForm {
                identifier: "alice@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await;
        assert!(good.success);

        let out = service.logout(good.token).await;
        assert!(out.success);
        assert!(!service.current_user(good.token).await.success);
        assert!(!service.logout(good.token).await.success);
    }

    #[tokio::test]
    async fn test_award_points() {
        let service = service();
        let token = service.register(&register_form("alice")).await.token;

        let award = service
            .award_points(token, 30, Duration::from_secs(90))
            .await
            .unwrap();
        assert_eq!(award, PointsAward { earned: 450, total: 550 });

        let me = service.current_user(token).await;
        assert_eq!(me.user.unwrap().points, 550);
    }

    #[tokio::test]
    async fn test_guest_gets_no_points() {
        let service = service();
        assert!(service.award_points(None, 30, Duration::from_secs(5)).await.is_none());
    }

    #[tokio::test]
    async fn test_guest_high_score_never_decreases() {
        let service = service();
        assert_eq!(service.high_score_for(None), 0);

        service.record_high_score(None, 40).await;
        assert_eq!(service.high_score_for(None), 40);

        service.record_high_score(None, 20).await;
        assert_eq!(service.high_score_for(None), 40);
    }

    #[tokio::test]
    async fn test_profile_high_score() {
        let service = service();
        let token = service.register(&register_form("alice")).await.token;

        service.record_high_score(token, 60).await;
        service.record_high_score(token, 10).await;
        assert_eq!(service.high_score_for(token), 60);

        let me = service.current_user(token).await;
        assert_eq!(me.user.unwrap().high_score, 60);
        // the guest record is separate
        assert_eq!(service.high_score_for(None), 0);
    }
}
