//! Error types for tracker clients

use shelfsync_core::{CoreError, Platform};
use shelfsync_network::NetworkError;
use thiserror::Error;

pub type ScrapeResult<T> = Result<T, ScrapeError>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The selected platform has no user identifier
    #[error("{} is not configured: no user identifier set", .0.label())]
    NotConfigured(Platform),

    /// Network failure, timeout or non-2xx answer
    #[error("Fetch failed: {0}")]
    Fetch(#[from] NetworkError),

    /// The page did not have the expected listing structure
    #[error("Unexpected page structure: {0}")]
    Parse(String),

    /// The platform redirected to its login page
    #[error("{} requires login: set a session token or make the profile public", .0.label())]
    AuthRequired(Platform),

    /// The headless render path failed outside plain HTTP
    #[error("Headless render failed: {0}")]
    Render(String),

    /// No client registered for the platform
    #[error("No client available for {}", .0.label())]
    Unsupported(Platform),
}

impl From<CoreError> for ScrapeError {
    fn from(err: CoreError) -> Self {
        ScrapeError::Parse(err.to_string())
    }
}

impl ScrapeError {
    /// Whether the failure is a configuration problem the user must fix
    pub fn is_config_error(&self) -> bool {
        matches!(self, ScrapeError::NotConfigured(_) | ScrapeError::Unsupported(_))
    }
}
