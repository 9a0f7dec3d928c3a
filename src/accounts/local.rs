//! Accounts kept in local storage (demo mode)

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use super::{AccountBackend, BackendMode, RegisterForm, Session, UserProfile};
use crate::config::{CURRENT_USER_KEY, SIGNUP_BONUS_POINTS, USERS_KEY};
use crate::error::AccountError;
use crate::storage::LocalStorage;

/// A user row in the local table
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredUser {
    #[serde(flatten)]
    profile: UserProfile,
    salt: String,
    password_hash: String,
}

/// Users keyed by username
type UserTable = BTreeMap<String, StoredUser>;

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct LocalAccounts {
    storage: Arc<LocalStorage>,
}

impl LocalAccounts {
    pub fn new(storage: Arc<LocalStorage>) -> Self {
        Self { storage }
    }

    /// The most recently signed-in user, as mirrored in storage
    pub fn current_user(&self) -> Result<Option<UserProfile>, AccountError> {
        Ok(self.storage.get_json(CURRENT_USER_KEY)?)
    }

    fn users(&self) -> Result<UserTable, AccountError> {
        Ok(self.storage.get_json(USERS_KEY)?.unwrap_or_default())
    }

    /// Apply `f` to the row of `user_id` and save both tables
    fn update_user<F>(&self, user_id: &str, f: F) -> Result<(), AccountError>
    where
        F: FnOnce(&mut UserProfile),
    {
        let profile = self
            .storage
            .update_json(USERS_KEY, |users: &mut UserTable| -> Result<_, AccountError> {
                let user = users
                    .values_mut()
                    .find(|u| u.profile.id == user_id)
                    .ok_or(AccountError::ProfileNotFound)?;
                f(&mut user.profile);
                Ok(user.profile.clone())
            })?;

        if self.current_user()?.is_some_and(|u| u.id == profile.id) {
            self.storage.set_json(CURRENT_USER_KEY, &profile)?;
        }
        Ok(())
    }
}

#[async_trait]
impl AccountBackend for LocalAccounts {
    fn mode(&self) -> BackendMode {
        BackendMode::Local
    }

    async fn sign_up(&self, form: &RegisterForm) -> Result<(Session, UserProfile), AccountError> {
        let username = form.username.trim().to_string();
        let email = form.email.trim().to_lowercase();

        let profile = self
            .storage
            .update_json(USERS_KEY, |users: &mut UserTable| -> Result<_, AccountError> {
                if users.contains_key(&username) {
                    return Err(AccountError::UsernameTaken);
                }
                if users.values().any(|u| u.profile.email == email) {
                    return Err(AccountError::EmailTaken);
                }

                let salt = Uuid::new_v4().simple().to_string();
                let profile = UserProfile {
                    id: Uuid::new_v4().to_string(),
                    username: username.clone(),
                    email: email.clone(),
                    points: SIGNUP_BONUS_POINTS,
                    high_score: 0,
                    created_at: Some(Utc::now()),
                };
                users.insert(
                    username.clone(),
                    StoredUser {
                        profile: profile.clone(),
                        password_hash: hash_password(&salt, &form.password),
                        salt,
                    },
                );
                Ok(profile)
            })?;

        self.storage.set_json(CURRENT_USER_KEY, &profile)?;
        info!("Local account created for {}", profile.username);

        let session = Session {
            user_id: profile.id.clone(),
            access_token: None,
        };
        Ok((session, profile))
    }

    async fn sign_in(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<(Session, UserProfile), AccountError> {
        let identifier = identifier.trim();
        let users = self.users()?;

        let user = users.get(identifier).or_else(|| {
            let email = identifier.to_lowercase();
            users.values().find(|u| u.profile.email == email)
        });

        let user = match user {
            Some(u) if hash_password(&u.salt, password) == u.password_hash => u,
            _ => return Err(AccountError::InvalidCredentials),
        };

        self.storage.set_json(CURRENT_USER_KEY, &user.profile)?;
        debug!("Local sign-in for {}", user.profile.username);

        let session = Session {
            user_id: user.profile.id.clone(),
            access_token: None,
        };
        Ok((session, user.profile.clone()))
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AccountError> {
        if self.current_user()?.is_some_and(|u| u.id == session.user_id) {
            self.storage.remove_item(CURRENT_USER_KEY)?;
        }
        Ok(())
    }

    async fn load_profile(&self, session: &Session) -> Result<UserProfile, AccountError> {
        self.users()?
            .into_values()
            .map(|u| u.profile)
            .find(|p| p.id == session.user_id)
            .ok_or(AccountError::ProfileNotFound)
    }

    async fn update_points(&self, session: &Session, total: u64) -> Result<(), AccountError> {
        self.update_user(&session.user_id, |p| p.points = total)
    }

    async fn update_high_score(&self, session: &Session, score: u32) -> Result<(), AccountError> {
        self.update_user(&session.user_id, |p| p.high_score = score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, email: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        }
    }

    fn accounts() -> LocalAccounts {
        LocalAccounts::new(Arc::new(LocalStorage::in_memory()))
    }

    #[tokio::test]
    async fn test_sign_up_grants_bonus() {
        let accounts = accounts();
        let (session, profile) = accounts.sign_up(&form("alice", "Alice@Example.com")).await.unwrap();

        assert_eq!(profile.points, SIGNUP_BONUS_POINTS);
        assert_eq!(profile.high_score, 0);
        assert_eq!(profile.email, "alice@example.com");
        assert_eq!(session.user_id, profile.id);
        assert!(session.access_token.is_none());
        assert_eq!(accounts.current_user().unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn test_duplicates_rejected() {
        let accounts = accounts();
        accounts.sign_up(&form("alice", "alice@example.com")).await.unwrap();

        assert!(matches!(
            accounts.sign_up(&form("alice", "other@example.com")).await,
            Err(AccountError::UsernameTaken)
        ));
        assert!(matches!(
            accounts.sign_up(&form("bob", "alice@example.com")).await,
            Err(AccountError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_sign_in_by_username_or_email() {
        let accounts = accounts();
        accounts.sign_up(&form("alice", "alice@example.com")).await.unwrap();

        assert!(accounts.sign_in("alice", "secret1").await.is_ok());
        assert!(accounts.sign_in("ALICE@example.com", "secret1").await.is_ok());
        assert!(matches!(
            accounts.sign_in("alice", "wrong!").await,
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            accounts.sign_in("nobody", "secret1").await,
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_password_not_stored_in_plaintext() {
        let storage = Arc::new(LocalStorage::in_memory());
        let accounts = LocalAccounts::new(storage.clone());
        accounts.sign_up(&form("alice", "alice@example.com")).await.unwrap();

        let raw = storage.get_item(USERS_KEY).unwrap();
        assert!(!raw.contains("secret1"));
    }

    #[tokio::test]
    async fn test_updates_persist_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let session = {
            let accounts = LocalAccounts::new(Arc::new(LocalStorage::open(&path).unwrap()));
            let (session, _) = accounts.sign_up(&form("alice", "alice@example.com")).await.unwrap();
            accounts.update_points(&session, 250).await.unwrap();
            accounts.update_high_score(&session, 70).await.unwrap();
            session
        };

        let accounts = LocalAccounts::new(Arc::new(LocalStorage::open(&path).unwrap()));
        let profile = accounts.load_profile(&session).await.unwrap();
        assert_eq!(profile.points, 250);
        assert_eq!(profile.high_score, 70);
        assert_eq!(accounts.current_user().unwrap().unwrap().points, 250);
    }

    #[tokio::test]
    async fn test_sign_out_clears_current_user() {
        let accounts = accounts();
        let (session, _) = accounts.sign_up(&form("alice", "alice@example.com")).await.unwrap();

        accounts.sign_out(&session).await.unwrap();
        assert_eq!(accounts.current_user().unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_user_update_fails() {
        let accounts = accounts();
        let session = Session {
            user_id: "missing".to_string(),
            access_token: None,
        };
        assert!(matches!(
            accounts.update_points(&session, 5).await,
            Err(AccountError::ProfileNotFound)
        ));
    }
}
