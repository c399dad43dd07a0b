//! The auth service boundary.

use thiserror::Error;
use tokio::sync::broadcast;

use crate::{AuthEvent, AuthSession, Credentials, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The service answered and refused (bad credentials, expired refresh
    /// token, ...). `message` is the service's own wording.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The service could not be reached.
    #[error("auth service unreachable: {0}")]
    Transport(String),

    /// The service answered with something we could not interpret.
    #[error("unexpected auth response: {0}")]
    Protocol(String),
}

impl AuthError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Message provided by the service, when there is one worth showing.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            AuthError::Rejected { message, .. } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Password-based session authentication with change notifications.
///
/// Implementations keep the current session themselves; callers learn about
/// identity changes through [`AuthService::subscribe`].
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verify credentials and open a session.
    ///
    /// On success a [`AuthEvent::signed_in`] notification is published.
    async fn sign_in_with_password(&self, credentials: &Credentials)
    -> Result<AuthSession, AuthError>;

    /// Close the current session. Publishes [`AuthEvent::signed_out`].
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Identity of the current session, `None` when signed out.
    async fn current_user(&self) -> Result<Option<Principal>, AuthError>;

    /// Register for session-change notifications.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
