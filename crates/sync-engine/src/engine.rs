// crates/sync-engine/src/engine.rs
//! Orchestrator exposing the operations the control surface calls

use crate::broadcaster::{BroadcastState, PresenceBroadcaster, StartOutcome, StopOutcome};
use crate::cache::BookCache;
use crate::context::EngineContext;
use crate::error::{EngineError, EngineResult};
use crate::selection::{Reconciled, SelectionState};
use crate::status::StatusLog;
use shelfsync_config::{Config, ConfigStore};
use shelfsync_core::{Book, BookKey, BookSet, Platform, StatusEvent, StatusKind};
use shelfsync_presence::PresenceConnector;
use shelfsync_scrapers::PlatformClients;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// Result of a successful refresh
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub books: BookSet,
    pub current_key: Option<BookKey>,
    /// Served from the cache without contacting the platform
    pub from_cache: bool,
}

/// Snapshot of the presence worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceStatus {
    pub state: BroadcastState,
    pub should_run: bool,
}

/// Main synchronization engine
///
/// Every public operation reports its outcome to the status log as well as
/// returning it, so a poller sees failures of both direct calls and the
/// background worker in one place.
pub struct SyncEngine {
    ctx: EngineContext,
    cache: BookCache,
    refresh_gate: tokio::sync::Mutex<()>,
    /// Serializes durable writes of the selection
    persist_lock: Mutex<()>,
    fetched_tx: watch::Sender<bool>,
    broadcaster: PresenceBroadcaster,
}

impl SyncEngine {
    /// Creates an engine, seeding the selection with the persisted book key
    pub fn new(
        config: Arc<dyn ConfigStore>,
        clients: PlatformClients,
        connector: Arc<dyn PresenceConnector>,
    ) -> EngineResult<Self> {
        let snapshot = config.snapshot()?;
        let selection = SelectionState::with_preferred(snapshot.reading.current_key());
        let (fetched_tx, fetched) = watch::channel(false);

        let ctx = EngineContext {
            config,
            selection: Arc::new(Mutex::new(selection)),
            status: Arc::new(StatusLog::new()),
            clients,
            connector,
            fetched,
        };

        Ok(Self {
            broadcaster: PresenceBroadcaster::new(ctx.clone()),
            ctx,
            cache: BookCache::new(),
            refresh_gate: tokio::sync::Mutex::new(()),
            persist_lock: Mutex::new(()),
            fetched_tx,
        })
    }

    /// Fetches (or reuses) the book set of the configured platform and
    /// reconciles the selection with it
    pub async fn refresh_books(&self) -> EngineResult<RefreshOutcome> {
        let result = self.refresh_inner().await;
        if let Err(e) = &result {
            self.ctx
                .report(StatusKind::Error, format!("Refresh failed: {}", e));
        }
        result
    }

    async fn refresh_inner(&self) -> EngineResult<RefreshOutcome> {
        let _gate = self.refresh_gate.lock().await;

        let config = self.ctx.config.snapshot()?;
        let platform = config.reading.platform;
        let client = self.ctx.clients.get(platform).ok_or_else(|| {
            EngineError::Config(format!("No client available for {}", platform.label()))
        })?;

        let fetched = self
            .cache
            .get_or_fetch(client.as_ref(), &config, config.reading.cache_ttl())
            .await?;

        let (reconciled, current_key) = {
            let mut selection = self
                .ctx
                .selection
                .lock()
                .map_err(|_| EngineError::LockPoisoned)?;
            let reconciled = selection.reconcile(fetched.books.clone());
            (reconciled, selection.current_key().cloned())
        };

        match &reconciled {
            Reconciled::Empty => return Err(EngineError::NotFound(platform)),
            Reconciled::Defaulted(_) => self.persist_current(),
            Reconciled::Kept(_) => {}
        }

        self.fetched_tx.send_replace(true);

        let source = if fetched.from_cache { " (cached)" } else { "" };
        self.ctx.report(
            StatusKind::Info,
            format!(
                "Found {} book(s) on {}{}",
                fetched.books.len(),
                platform.label(),
                source
            ),
        );

        Ok(RefreshOutcome {
            books: fetched.books,
            current_key,
            from_cache: fetched.from_cache,
        })
    }

    /// Durable write of the sticky key; the in-memory choice stands either way
    ///
    /// The key is read under the writer lock, so whichever write lands last
    /// stores the selection as it is now rather than when the write was
    /// requested.
    fn persist_current(&self) {
        let _writer = self
            .persist_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let key = match self.ctx.selection.lock() {
            Ok(selection) => selection.current_key().cloned(),
            Err(_) => {
                log::warn!("Selection lock poisoned; current book not persisted");
                return;
            }
        };
        let Some(key) = key else {
            return;
        };

        let value = key.to_string();
        if let Err(e) = self
            .ctx
            .config
            .update(&mut |config| config.reading.current_book_key = value.clone())
        {
            log::warn!("Failed to persist current book '{}': {}", key, e);
        }
    }

    /// Makes `key` the current book
    pub fn select_book(&self, key: &str) -> EngineResult<Book> {
        let result = self.select_inner(key);
        match &result {
            Ok(book) => self
                .ctx
                .report(StatusKind::Info, format!("Selected {}", book.display_label())),
            Err(e) => self.ctx.report(StatusKind::Error, e.to_string()),
        }
        result
    }

    fn select_inner(&self, raw: &str) -> EngineResult<Book> {
        let key = BookKey::new(raw).map_err(|_| EngineError::InvalidKey(raw.to_string()))?;
        let book = {
            let mut selection = self
                .ctx
                .selection
                .lock()
                .map_err(|_| EngineError::LockPoisoned)?;
            selection.select(&key)?.clone()
        };
        self.persist_current();
        Ok(book)
    }

    /// The current book, if any fetch has produced one
    pub fn current_book(&self) -> EngineResult<Option<Book>> {
        self.ctx.current_book()
    }

    /// The most recently reconciled book set
    pub fn books(&self) -> EngineResult<BookSet> {
        let selection = self
            .ctx
            .selection
            .lock()
            .map_err(|_| EngineError::LockPoisoned)?;
        Ok(selection.books().clone())
    }

    /// Returns and clears the accumulated status events
    pub fn drain_status(&self) -> EngineResult<Vec<StatusEvent>> {
        self.ctx.status.drain()
    }

    pub fn start_presence(&self) -> EngineResult<StartOutcome> {
        let outcome = self.broadcaster.request_start();
        match &outcome {
            Ok(StartOutcome::Started) => self.ctx.report(StatusKind::Info, "Presence starting"),
            Ok(StartOutcome::AlreadyRunning) => {
                self.ctx.report(StatusKind::Info, "Presence already running")
            }
            Err(e) => self.ctx.report(StatusKind::Error, e.to_string()),
        }
        outcome
    }

    pub fn stop_presence(&self) -> EngineResult<StopOutcome> {
        let outcome = self.broadcaster.request_stop();
        match &outcome {
            Ok(StopOutcome::Stopping) => self.ctx.report(StatusKind::Info, "Presence stopping"),
            Ok(StopOutcome::NotRunning) => {
                self.ctx.report(StatusKind::Info, "Presence is not running")
            }
            Err(e) => self.ctx.report(StatusKind::Error, e.to_string()),
        }
        outcome
    }

    pub fn presence_state(&self) -> EngineResult<PresenceStatus> {
        Ok(PresenceStatus {
            state: self.broadcaster.state()?,
            should_run: self.broadcaster.should_run(),
        })
    }

    /// Forces the next refresh to contact the platform
    pub fn clear_cache(&self) -> EngineResult<()> {
        self.cache.invalidate()?;
        self.ctx.report(StatusKind::Info, "Cache cleared");
        Ok(())
    }

    /// Current configuration snapshot
    pub fn config(&self) -> EngineResult<Config> {
        Ok(self.ctx.config.snapshot()?)
    }

    /// Validates and stores a new configuration
    ///
    /// The persisted book key is owned by the engine and is carried over
    /// from the live selection. Changing a platform's identifier or session
    /// token drops that platform's cached book set.
    pub fn save_config(&self, mut config: Config) -> EngineResult<()> {
        let result = self.save_inner(&mut config);
        match &result {
            Ok(()) => self.ctx.report(StatusKind::Info, "Configuration saved"),
            Err(e) => self.ctx.report(StatusKind::Error, e.to_string()),
        }
        result
    }

    fn save_inner(&self, config: &mut Config) -> EngineResult<()> {
        let _writer = self
            .persist_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let previous = self.ctx.config.snapshot()?;

        let current = self
            .ctx
            .selection
            .lock()
            .map_err(|_| EngineError::LockPoisoned)?
            .current_key()
            .cloned();
        if let Some(key) = current {
            config.reading.current_book_key = key.to_string();
        }

        self.ctx.config.save(config)?;

        for platform in Platform::ALL {
            let identity_changed = previous.reading.identifier(platform)
                != config.reading.identifier(platform)
                || (platform == Platform::StoryGraph
                    && previous.reading.session_token() != config.reading.session_token());
            if identity_changed {
                log::info!("{} account changed; dropping its cached books", platform.label());
                self.cache.invalidate_platform(platform)?;
            }
        }
        Ok(())
    }

    /// Stops the presence worker and waits for its cleanup
    pub async fn shutdown(&self) -> EngineResult<()> {
        self.broadcaster.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shelfsync_config::MemoryConfigStore;
    use shelfsync_presence::{PresenceError, PresenceResult, PresenceSession};
    use shelfsync_scrapers::{PlatformClient, ScrapeResult};

    struct NoPresence;

    #[async_trait]
    impl PresenceConnector for NoPresence {
        async fn connect(&self, _app_id: &str) -> PresenceResult<Box<dyn PresenceSession>> {
            Err(PresenceError::Connect("unavailable".to_string()))
        }
    }

    struct FixedClient;

    #[async_trait]
    impl PlatformClient for FixedClient {
        fn platform(&self) -> Platform {
            Platform::Goodreads
        }

        async fn fetch(&self, _config: &Config) -> ScrapeResult<BookSet> {
            let books = ["111", "222"]
                .iter()
                .map(|k| Book::new(BookKey::new(k).unwrap(), "Title", "Author", Platform::Goodreads))
                .collect();
            Ok(BookSet::from_books(books).unwrap())
        }

        fn profile_url(&self, _config: &Config) -> Option<String> {
            None
        }
    }

    fn engine(store: MemoryConfigStore) -> SyncEngine {
        let clients = PlatformClients::new().with_client(Arc::new(FixedClient));
        SyncEngine::new(Arc::new(store), clients, Arc::new(NoPresence)).unwrap()
    }

    #[tokio::test]
    async fn test_missing_client_is_config_error() {
        let mut config = Config::default();
        config.reading.platform = Platform::StoryGraph;
        let engine = engine(MemoryConfigStore::new(config));

        let err = engine.refresh_books().await.unwrap_err();
        assert_eq!(err.code(), "config_error");
    }

    #[tokio::test]
    async fn test_save_config_keeps_live_selection() {
        let store = MemoryConfigStore::new(Config::default());
        let engine = engine(store.clone());
        engine.refresh_books().await.unwrap();
        engine.select_book("222").unwrap();

        let mut edited = engine.config().unwrap();
        edited.reading.current_book_key.clear();
        edited.presence.update_interval_secs = 30;
        engine.save_config(edited).unwrap();

        let stored = store.snapshot().unwrap();
        assert_eq!(stored.reading.current_book_key, "222");
        assert_eq!(stored.presence.update_interval_secs, 30);
    }

    #[tokio::test]
    async fn test_failed_select_is_reported() {
        let engine = engine(MemoryConfigStore::new(Config::default()));
        engine.refresh_books().await.unwrap();
        engine.drain_status().unwrap();

        assert!(engine.select_book("  ").is_err());
        let events = engine.drain_status().unwrap();
        assert!(events.iter().any(|e| e.kind == StatusKind::Error));
    }
}
