//! Error types for dashboard-sync

use thiserror::Error;

/// Result type alias for gateway calls
pub type Result<T> = std::result::Result<T, SyncError>;

/// Failures talking to the gateway
#[derive(Debug, Error)]
pub enum SyncError {
    /// The gateway could not be reached
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway answered with something that is not the expected JSON
    #[error("invalid gateway payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The gateway answered with its error envelope
    #[error("{error}: {detail}")]
    Gateway {
        status: u16,
        error: String,
        detail: String,
    },
}
