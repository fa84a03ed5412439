//! Relay error types

use thiserror::Error;

/// Terminal failure of a streaming call
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("API request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("API error {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("stream read error: {0}")]
    Read(#[source] reqwest::Error),
}

impl RelayError {
    /// HTTP status for provider-side rejections
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            RelayError::Status { status, .. } => Some(*status),
            RelayError::Request(e) | RelayError::Read(e) => e.status(),
            _ => None,
        }
    }
}
