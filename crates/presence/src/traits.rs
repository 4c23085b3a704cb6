//! Presence channel abstraction

use crate::{PresencePayload, PresenceResult};
use async_trait::async_trait;

/// Opens sessions with the presence service
#[async_trait]
pub trait PresenceConnector: Send + Sync {
    async fn connect(&self, app_id: &str) -> PresenceResult<Box<dyn PresenceSession>>;
}

/// A live connection to the presence service
#[async_trait]
pub trait PresenceSession: Send {
    /// Replaces the displayed activity
    async fn update(&mut self, payload: &PresencePayload) -> PresenceResult<()>;

    /// Removes the displayed activity
    async fn clear(&mut self) -> PresenceResult<()>;

    /// Ends the session; the session must not be used afterwards
    async fn close(&mut self) -> PresenceResult<()>;
}
