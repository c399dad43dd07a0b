//! HTTP client for the hosted data/auth service.
//!
//! Speaks the GoTrue auth API under `/auth/v1` and the PostgREST table API
//! under `/rest/v1`. The session lives in memory only.

mod auth;
mod data;

use std::sync::{Arc, RwLock};

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::broadcast;

use clinic_auth::{AuthEvent, AuthSession};
use clinic_core::{Clock, SystemClock};

use crate::BackendError;

const EVENT_CAPACITY: usize = 16;

/// Client for one project of the hosted service.
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: RwLock<Option<AuthSession>>,
    events: broadcast::Sender<AuthEvent>,
    clock: Arc<dyn Clock>,
}

impl SupabaseClient {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self::with_clock(base_url, anon_key, Arc::new(SystemClock))
    }

    pub fn with_clock(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            session: RwLock::new(None),
            events,
            clock,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Attach the project key and a bearer token.
    fn authorize(&self, request: RequestBuilder, bearer: &str) -> RequestBuilder {
        request.header("apikey", &self.anon_key).bearer_auth(bearer)
    }

    fn current_session(&self) -> Option<AuthSession> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    fn store_session(&self, session: Option<AuthSession>) {
        match self.session.write() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }

    fn publish(&self, event: AuthEvent) {
        // No receivers is fine: nobody is listening yet.
        let _ = self.events.send(event);
    }
}

/// Error body shapes used by the auth and table APIs.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    code: Option<serde_json::Value>,
}

impl ErrorBody {
    fn message(&self) -> Option<String> {
        [&self.message, &self.msg, &self.error_description, &self.error]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
            .cloned()
    }

    fn code(&self) -> Option<String> {
        self.code.as_ref().map(|c| match c {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Row-count error for single-row reads.
const NO_ROWS_CODE: &str = "PGRST116";

/// Read an error response into `(status, code, message)`.
async fn read_error(response: Response) -> (StatusCode, Option<String>, String) {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let message = body
        .message()
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    (status, body.code(), message)
}

/// Map a failed table response to a [`BackendError`].
///
/// Single-row requests that match nothing come back as 406 / `PGRST116`.
async fn table_error(response: Response, single: bool) -> BackendError {
    let (status, code, message) = read_error(response).await;
    if single && (status == StatusCode::NOT_ACCEPTABLE || code.as_deref() == Some(NO_ROWS_CODE)) {
        return BackendError::NotFound;
    }
    BackendError::api(status.as_u16(), code, message)
}
