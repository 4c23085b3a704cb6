// crates/sync-engine/src/lib.rs
//! Reading-status to presence synchronization engine
//!
//! This crate ties the tracker clients to the presence channel:
//! - TTL cache of fetched book sets, one entry per platform
//! - Sticky current-book selection persisted through the config store
//! - Background presence worker with reconnect and backoff
//! - Drainable status log for the control surface
//!
//! # Example
//!
//! ```no_run
//! use shelfsync_config::ConfigManager;
//! use shelfsync_network::Client;
//! use shelfsync_presence::DiscordIpcConnector;
//! use shelfsync_scrapers::PlatformClients;
//! use shelfsync_sync_engine::SyncEngine;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = SyncEngine::new(
//!     Arc::new(ConfigManager::new()?),
//!     PlatformClients::builtin(Client::new()?),
//!     Arc::new(DiscordIpcConnector::new()),
//! )?;
//!
//! let outcome = engine.refresh_books().await?;
//! println!("{} book(s), current: {:?}", outcome.books.len(), outcome.current_key);
//! engine.start_presence()?;
//! # Ok(())
//! # }
//! ```

mod broadcaster;
mod cache;
mod context;
mod engine;
mod error;
mod selection;
mod status;

pub use broadcaster::{BroadcastState, StartOutcome, StopOutcome};
pub use cache::{BookCache, Fetched};
pub use engine::{PresenceStatus, RefreshOutcome, SyncEngine};
pub use error::{EngineError, EngineResult};
pub use selection::{Reconciled, SelectionState};
pub use status::{StatusLog, MAX_STATUS_EVENTS};
