use thiserror::Error;

pub type BackendResult<T> = Result<T, BackendError>;

/// Failure talking to the data service.
///
/// This is the Rust rendition of the service's `{data, error}` envelope: every
/// call yields either the data or one of these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The service could not be reached.
    #[error("backend unreachable: {0}")]
    Network(String),

    /// The service answered with an error status.
    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// A single-row request matched no row.
    #[error("record not found")]
    NotFound,

    /// The response did not have the expected shape.
    #[error("malformed backend response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn api(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound)
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}
