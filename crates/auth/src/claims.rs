use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::Principal;

/// An authenticated session issued by the auth service.
///
/// Held in memory only; the application never persists tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: Principal,
}

impl core::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthSession")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("session has expired")]
    Expired,

    #[error("session has no access token")]
    MissingToken,
}

/// Deterministically validate a session against `now`.
///
/// Note: this checks the session *envelope* only. Signature verification is
/// the auth service's business.
pub fn validate_session(
    session: &AuthSession,
    now: DateTime<Utc>,
) -> Result<(), TokenValidationError> {
    if session.access_token.is_empty() {
        return Err(TokenValidationError::MissingToken);
    }
    if now >= session.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
