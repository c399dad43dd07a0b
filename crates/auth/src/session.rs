//! Session state component.
//!
//! Holds the current identity and a loading flag, mirrors the auth service's
//! session-change notifications, and exposes sign-in / sign-out.
//!
//! # Invariants
//! - After [`SessionState::start`], identity changes only through
//!   notifications, plus the optimistic clear on a successful sign-out.
//! - A successful sign-in never sets identity directly; the `SignedIn`
//!   notification does. This keeps a single writer for identity.
//! - Failures are logged and returned as an [`AuthFailure`]; nothing is retried.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::{AuthEvent, AuthService, Credentials, Principal};

pub const SIGN_IN_FAILED: &str = "Erro ao fazer login";
pub const SIGN_OUT_FAILED: &str = "Erro ao fazer logout";

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<Principal>,
    pub loading: bool,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

/// User-facing outcome of a failed sign-in or sign-out.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AuthFailure {
    pub message: String,
}

impl AuthFailure {
    fn from_error(err: &crate::AuthError, fallback: &str) -> Self {
        Self {
            message: err.service_message().unwrap_or(fallback).to_string(),
        }
    }
}

/// Session state shared by the shell and the views.
pub struct SessionState {
    auth: Arc<dyn AuthService>,
    state: watch::Sender<SessionSnapshot>,
}

impl SessionState {
    /// New state in the "loading, no identity" position.
    pub fn new(auth: Arc<dyn AuthService>) -> Arc<Self> {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Arc::new(Self { auth, state })
    }

    /// Subscribe to session changes, then resolve the initial identity.
    ///
    /// Listening starts before the initial fetch so no change is missed. The
    /// returned handle keeps the listener alive; drop or
    /// [`SessionSubscription::unsubscribe`] it on teardown.
    pub async fn start(self: &Arc<Self>) -> SessionSubscription {
        let events = self.auth.subscribe();
        let task = tokio::spawn(Self::listen(Arc::clone(self), events));

        match self.auth.current_user().await {
            Ok(user) => {
                tracing::info!(authenticated = user.is_some(), "initial session resolved");
                self.state.send_modify(|s| s.user = user);
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to resolve initial session");
            }
        }
        self.state.send_modify(|s| s.loading = false);

        SessionSubscription { task: Some(task) }
    }

    async fn listen(self: Arc<Self>, mut events: broadcast::Receiver<AuthEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.apply(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "session listener lagged behind notifications");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("auth notifications closed");
                    break;
                }
            }
        }
    }

    fn apply(&self, event: &AuthEvent) {
        tracing::debug!(kind = ?event.kind, "session change");
        let user = event.user().cloned();
        self.state.send_modify(|s| {
            s.user = user;
            s.loading = false;
        });
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<(), AuthFailure> {
        let _loading = self.begin_loading();
        match self.auth.sign_in_with_password(credentials).await {
            Ok(_) => {
                tracing::info!(email = %credentials.email, "signed in");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, email = %credentials.email, "sign-in failed");
                Err(AuthFailure::from_error(&err, SIGN_IN_FAILED))
            }
        }
    }

    pub async fn sign_out(&self) -> Result<(), AuthFailure> {
        let _loading = self.begin_loading();
        match self.auth.sign_out().await {
            Ok(()) => {
                self.state.send_modify(|s| s.user = None);
                tracing::info!("signed out");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "sign-out failed");
                Err(AuthFailure::from_error(&err, SIGN_OUT_FAILED))
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<Principal> {
        self.state.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Receiver that observes every state change.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        self.state.send_modify(|s| s.loading = true);
        LoadingGuard { state: &self.state }
    }
}

/// Clears the loading flag when the operation that set it finishes or is
/// dropped mid-flight.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<SessionSnapshot>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.loading = false);
    }
}

/// Handle to the session-change listener.
#[derive(Debug)]
pub struct SessionSubscription {
    task: Option<JoinHandle<()>>,
}

impl SessionSubscription {
    /// Stop listening for session changes.
    pub fn unsubscribe(mut self) {
        self.stop();
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("session listener stopped");
        }
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.stop();
    }
}
