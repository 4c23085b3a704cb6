// crates/network/src/error.rs
//! Error types for network operations

use crate::client::RETRYABLE_STATUSES;
use shelfsync_resilience::ResilienceError;
use thiserror::Error;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors that can occur during network operations
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Transport-level failure (DNS, connect, TLS, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A single request or the whole retry sequence ran out of time
    #[error("Request timed out")]
    Timeout,

    /// Response body was not the expected JSON
    #[error("Invalid JSON response: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl NetworkError {
    /// Maps a reqwest error, singling out timeouts
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NetworkError::Timeout
        } else {
            NetworkError::Http(e)
        }
    }

    /// Returns true if the request may be retried (429 and transient 5xx only)
    pub fn is_retryable(&self) -> bool {
        matches!(self, NetworkError::Status { status, .. } if RETRYABLE_STATUSES.contains(status))
    }

    /// HTTP status of the failure, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            NetworkError::Status { status, .. } => Some(*status),
            NetworkError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<ResilienceError> for NetworkError {
    fn from(e: ResilienceError) -> Self {
        match e {
            ResilienceError::Timeout(_) => NetworkError::Timeout,
        }
    }
}
