//! Error types for backend-client

use std::time::Duration;
use thiserror::Error;

/// Result type alias for backend calls
pub type Result<T> = std::result::Result<T, BackendError>;

/// Ways a backend call can fail
#[derive(Debug, Error)]
pub enum BackendError {
    /// The call did not complete within its bound
    #[error("backend call timed out after {}ms", after.as_millis())]
    Timeout { after: Duration },

    /// Connection, DNS or other network failure
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// Body was not valid JSON or had an unexpected shape
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    /// Backend answered, but with an error
    #[error("backend error (status {status}): {message}")]
    Backend { status: u16, message: String },
}

impl BackendError {
    /// Stable name of the error category
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Unreachable(_) => "unreachable",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Backend { .. } => "backend_error",
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}
