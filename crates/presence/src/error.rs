//! Error types for the presence channel

use thiserror::Error;

pub type PresenceResult<T> = Result<T, PresenceError>;

#[derive(Debug, Error)]
pub enum PresenceError {
    /// The presence service could not be reached or refused the handshake
    #[error("Failed to connect to presence service: {0}")]
    Connect(String),

    /// A push failed mid-session (reset, broken pipe, rejected payload)
    #[error("Presence update failed: {0}")]
    Update(String),
}

impl PresenceError {
    pub(crate) fn update_io(err: std::io::Error) -> Self {
        PresenceError::Update(format!("{} ({:?})", err, err.kind()))
    }
}
