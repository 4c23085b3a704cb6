// crates/sync-engine/src/error.rs
//! Error types for engine operations

use shelfsync_config::ConfigError;
use shelfsync_core::Platform;
use shelfsync_scrapers::ScrapeError;
use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced to the control surface
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or invalid settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Fetch, parse or login failure from a tracker client
    #[error(transparent)]
    Scrape(ScrapeError),

    /// The requested book is not in the current set
    #[error("Book '{0}' is not in the current reading list")]
    InvalidKey(String),

    /// The tracker returned an empty currently-reading list
    #[error("No books currently being read on {}", .0.label())]
    NotFound(Platform),

    /// Background work needs a Tokio runtime
    #[error("No async runtime available: {0}")]
    Runtime(String),

    /// A component lock was poisoned by a panicking thread
    #[error("Lock poisoned")]
    LockPoisoned,
}

impl EngineError {
    /// Stable machine-readable tag for structured responses
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Config(_) => "config_error",
            EngineError::Scrape(ScrapeError::Fetch(_)) => "fetch_error",
            EngineError::Scrape(ScrapeError::Parse(_)) => "parse_error",
            EngineError::Scrape(ScrapeError::AuthRequired(_)) => "auth_required",
            EngineError::Scrape(_) => "fetch_error",
            EngineError::InvalidKey(_) => "invalid_key",
            EngineError::NotFound(_) => "not_found",
            EngineError::Runtime(_) => "runtime_error",
            EngineError::LockPoisoned => "internal_error",
        }
    }
}

impl From<ScrapeError> for EngineError {
    fn from(err: ScrapeError) -> Self {
        if err.is_config_error() {
            EngineError::Config(err.to_string())
        } else {
            EngineError::Scrape(err)
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::Config(err.to_string())
    }
}
