// crates/sync-engine/src/context.rs
//! Components shared by the orchestrator and the background worker

use crate::error::{EngineError, EngineResult};
use crate::selection::SelectionState;
use crate::status::StatusLog;
use shelfsync_config::ConfigStore;
use shelfsync_core::{Book, StatusKind};
use shelfsync_presence::PresenceConnector;
use shelfsync_scrapers::PlatformClients;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Each component carries its own lock; nothing here is held across I/O
#[derive(Clone)]
pub(crate) struct EngineContext {
    pub config: Arc<dyn ConfigStore>,
    pub selection: Arc<Mutex<SelectionState>>,
    pub status: Arc<StatusLog>,
    pub clients: PlatformClients,
    pub connector: Arc<dyn PresenceConnector>,
    /// Flips to `true` after the first successful fetch
    pub fetched: watch::Receiver<bool>,
}

impl EngineContext {
    pub fn current_book(&self) -> EngineResult<Option<Book>> {
        let selection = self
            .selection
            .lock()
            .map_err(|_| EngineError::LockPoisoned)?;
        Ok(selection.current().cloned())
    }

    /// Appends a status event; a broken log only loses the event
    pub fn report(&self, kind: StatusKind, message: impl Into<String>) {
        if let Err(e) = self.status.append(kind, message) {
            log::error!("Status log unavailable: {}", e);
        }
    }
}
