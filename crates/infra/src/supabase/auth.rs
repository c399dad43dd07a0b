use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;

use clinic_auth::{
    AuthError, AuthEvent, AuthService, AuthSession, Credentials, Principal, validate_session,
};

use super::{SupabaseClient, read_error};

/// Token grant response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: Principal,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or_else(|| now + Duration::seconds(self.expires_in.unwrap_or(3600)));
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

fn transport(err: reqwest::Error) -> AuthError {
    AuthError::Transport(err.to_string())
}

impl SupabaseClient {
    async fn grant(&self, grant_type: &str, body: serde_json::Value) -> Result<AuthSession, AuthError> {
        let response = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let (status, _, message) = read_error(response).await;
            return Err(AuthError::rejected(status.as_u16(), message));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Protocol(e.to_string()))?;
        Ok(token.into_session(self.clock.now()))
    }

    /// Drop the local session and tell listeners.
    fn end_session(&self) {
        self.store_session(None);
        self.publish(AuthEvent::signed_out());
    }

    /// Current session, refreshed first if its access token expired.
    ///
    /// A refresh the service rejects ends the session (`Ok(None)`).
    pub(super) async fn live_session(&self) -> Result<Option<AuthSession>, AuthError> {
        let Some(session) = self.current_session() else {
            return Ok(None);
        };
        if validate_session(&session, self.clock.now()).is_ok() {
            return Ok(Some(session));
        }

        tracing::debug!("access token expired; refreshing");
        match self
            .grant("refresh_token", json!({ "refresh_token": session.refresh_token }))
            .await
        {
            Ok(refreshed) => {
                self.store_session(Some(refreshed.clone()));
                self.publish(AuthEvent::token_refreshed(refreshed.clone()));
                Ok(Some(refreshed))
            }
            Err(err @ AuthError::Rejected { .. }) => {
                tracing::warn!(error = %err, "session refresh rejected; signing out");
                self.end_session();
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait::async_trait]
impl AuthService for SupabaseClient {
    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, AuthError> {
        let session = self
            .grant(
                "password",
                json!({ "email": credentials.email, "password": credentials.password }),
            )
            .await?;
        self.store_session(Some(session.clone()));
        self.publish(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.current_session() else {
            self.end_session();
            return Ok(());
        };

        let response = self
            .authorize(self.http.post(self.auth_url("logout")), &session.access_token)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        // A token the service no longer knows is as good as signed out.
        let already_gone = matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
        );
        if !status.is_success() && !already_gone {
            let (status, _, message) = read_error(response).await;
            return Err(AuthError::rejected(status.as_u16(), message));
        }

        self.end_session();
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<Principal>, AuthError> {
        let Some(session) = self.live_session().await? else {
            return Ok(None);
        };

        let response = self
            .authorize(self.http.get(self.auth_url("user")), &session.access_token)
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            status if status.is_success() => {
                let user: Principal = response
                    .json()
                    .await
                    .map_err(|e| AuthError::Protocol(e.to_string()))?;
                Ok(Some(user))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::info!("stored session no longer valid");
                self.end_session();
                Ok(None)
            }
            _ => {
                let (status, _, message) = read_error(response).await;
                Err(AuthError::rejected(status.as_u16(), message))
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
