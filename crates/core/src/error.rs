//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic domain failures. Backend and transport failures live in
/// `clinic-infra`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation. The message is user-facing.
    #[error("{0}")]
    Validation(String),

    /// Text that does not parse as the expected id.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Message suitable for an inline form error.
    pub fn user_message(&self) -> String {
        match self {
            DomainError::Validation(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_shown_verbatim() {
        let err = DomainError::validation("Nome é obrigatório");
        assert_eq!(err.to_string(), "Nome é obrigatório");
        assert_eq!(err.user_message(), "Nome é obrigatório");
    }

    #[test]
    fn invalid_ids_keep_their_prefix() {
        assert_eq!(
            DomainError::invalid_id("PatientId: bad").user_message(),
            "invalid identifier: PatientId: bad"
        );
    }
}
