//! Accounts on a hosted auth + table service (Supabase-style REST)

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{AccountBackend, BackendMode, RegisterForm, Session, UserProfile};
use crate::config::{RemoteConfig, HTTP_TIMEOUT_SECS, PROFILE_TABLE, SIGNUP_BONUS_POINTS};
use crate::error::AccountError;

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

/// Sign-up answers with a session, or with just the user while the email
/// address awaits confirmation
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(AuthUser),
}

/// The service reports errors under one of several keys
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
    }
}

pub struct RemoteAccounts {
    client: Client,
    config: RemoteConfig,
}

impl RemoteAccounts {
    pub fn new(config: RemoteConfig) -> Result<Self, AccountError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, config })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url, path)
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url, PROFILE_TABLE)
    }

    /// Attach the project key and a bearer token (the anon key when signed out)
    fn authorized(&self, request: RequestBuilder, session: Option<&Session>) -> RequestBuilder {
        let bearer = session
            .and_then(|s| s.access_token.as_deref())
            .unwrap_or(self.config.anon_key.as_str());
        request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }

    /// Map non-2xx responses to `AccountError::Remote`
    async fn check(response: Response) -> Result<Response, AccountError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

        warn!("Hosted service returned {}: {}", status, message);
        Err(AccountError::Remote {
            status: status.as_u16(),
            message,
        })
    }

    /// Upsert the profile row for a new user
    async fn create_profile(&self, session: &Session, profile: &UserProfile) -> Result<(), AccountError> {
        let request = self
            .client
            .post(self.table_url())
            .header("Prefer", "resolution=merge-duplicates")
            .json(profile);
        Self::check(self.authorized(request, Some(session)).send().await?).await?;
        Ok(())
    }

    async fn patch_profile(&self, session: &Session, body: serde_json::Value) -> Result<(), AccountError> {
        let request = self
            .client
            .patch(self.table_url())
            .query(&[("id", format!("eq.{}", session.user_id))])
            .json(&body);
        Self::check(self.authorized(request, Some(session)).send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl AccountBackend for RemoteAccounts {
    fn mode(&self) -> BackendMode {
        BackendMode::Remote
    }

    async fn sign_up(&self, form: &RegisterForm) -> Result<(Session, UserProfile), AccountError> {
        let username = form.username.trim();
        let email = form.email.trim();

        let request = self.client.post(self.auth_url("signup")).json(&json!({
            "email": email,
            "password": form.password,
            "data": { "username": username },
        }));
        let response = Self::check(self.authorized(request, None).send().await?).await?;

        let (user, access_token) = match response.json::<SignUpResponse>().await? {
            SignUpResponse::Session(t) => (t.user, Some(t.access_token)),
            SignUpResponse::User(u) => (u, None),
        };

        let session = Session {
            user_id: user.id.clone(),
            access_token,
        };
        let profile = UserProfile {
            id: user.id,
            username: username.to_string(),
            email: user.email.unwrap_or_else(|| email.to_string()),
            points: SIGNUP_BONUS_POINTS,
            high_score: 0,
            created_at: Some(Utc::now()),
        };

        self.create_profile(&session, &profile).await?;
        debug!("Hosted profile created for {}", profile.username);

        Ok((session, profile))
    }

    async fn sign_in(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<(Session, UserProfile), AccountError> {
        let request = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": identifier.trim(), "password": password }));

        let response = Self::check(self.authorized(request, None).send().await?).await;
        let token: TokenResponse = match response {
            Ok(r) => r.json().await?,
            Err(AccountError::Remote { status: 400, .. }) => return Err(AccountError::InvalidCredentials),
            Err(e) => return Err(e),
        };

        let session = Session {
            user_id: token.user.id,
            access_token: Some(token.access_token),
        };
        let profile = self.load_profile(&session).await?;
        Ok((session, profile))
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AccountError> {
        let request = self.client.post(self.auth_url("logout"));
        Self::check(self.authorized(request, Some(session)).send().await?).await?;
        Ok(())
    }

    async fn load_profile(&self, session: &Session) -> Result<UserProfile, AccountError> {
        let request = self.client.get(self.table_url()).query(&[
            ("id", format!("eq.{}", session.user_id)),
            ("select", "*".to_string()),
        ]);
        let response = Self::check(self.authorized(request, Some(session)).send().await?).await?;

        let rows: Vec<UserProfile> = response.json().await?;
        rows.into_iter().next().ok_or(AccountError::ProfileNotFound)
    }

    async fn update_points(&self, session: &Session, total: u64) -> Result<(), AccountError> {
        self.patch_profile(session, json!({ "points": total })).await
    }

    async fn update_high_score(&self, session: &Session, score: u32) -> Result<(), AccountError> {
        self.patch_profile(session, json!({ "high_score": score })).await
    }
}
