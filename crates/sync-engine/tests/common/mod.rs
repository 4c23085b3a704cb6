// crates/sync-engine/tests/common/mod.rs
//! Test doubles for the tracker clients and the presence channel

#![allow(dead_code)]

use async_trait::async_trait;
use shelfsync_config::Config;
use shelfsync_core::{Book, BookKey, BookSet, Platform};
use shelfsync_presence::{
    PresenceConnector, PresenceError, PresencePayload, PresenceResult, PresenceSession,
};
use shelfsync_scrapers::{PlatformClient, ScrapeError, ScrapeResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn book(key: &str, platform: Platform) -> Book {
    Book::new(
        BookKey::new(key).unwrap(),
        format!("Book {}", key),
        "Test Author",
        platform,
    )
    .with_start_date("Jan 05, 2024")
}

/// Tracker client returning a configurable set, with queued failures
pub struct MockPlatformClient {
    platform: Platform,
    keys: Mutex<Vec<String>>,
    failures: Mutex<VecDeque<ScrapeError>>,
    calls: AtomicUsize,
}

impl MockPlatformClient {
    pub fn new(platform: Platform, keys: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            platform,
            keys: Mutex::new(keys.iter().map(|k| k.to_string()).collect()),
            failures: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_keys(&self, keys: &[&str]) {
        *self.keys.lock().unwrap() = keys.iter().map(|k| k.to_string()).collect();
    }

    pub fn fail_next(&self, err: ScrapeError) {
        self.failures.lock().unwrap().push_back(err);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformClient for MockPlatformClient {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch(&self, _config: &Config) -> ScrapeResult<BookSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let books = self
            .keys
            .lock()
            .unwrap()
            .iter()
            .map(|k| book(k, self.platform))
            .collect();
        Ok(BookSet::from_books(books).unwrap())
    }

    fn profile_url(&self, config: &Config) -> Option<String> {
        config
            .reading
            .identifier(self.platform)
            .map(|id| format!("https://tracker.test/user/{}", id))
    }
}

/// What the fake presence service has seen
#[derive(Default)]
pub struct PresenceLog {
    pub connects: AtomicUsize,
    pub clears: AtomicUsize,
    pub closes: AtomicUsize,
    pub shown: Mutex<Vec<PresencePayload>>,
}

impl PresenceLog {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn shown(&self) -> Vec<PresencePayload> {
        self.shown.lock().unwrap().clone()
    }
}

/// Presence connector whose connect and update outcomes are scripted
///
/// Connects and updates run through their scripts in order; unscripted
/// calls succeed.
#[derive(Default)]
pub struct ScriptedConnector {
    pub log: Arc<PresenceLog>,
    connect_script: Mutex<VecDeque<Option<String>>>,
    update_failures: Arc<Mutex<VecDeque<String>>>,
}

impl ScriptedConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_connect(&self, message: &str) {
        self.connect_script
            .lock()
            .unwrap()
            .push_back(Some(message.to_string()));
    }

    /// Queues a successful connect ahead of later scripted failures
    pub fn succeed_connect(&self) {
        self.connect_script.lock().unwrap().push_back(None);
    }

    pub fn fail_update(&self, message: &str) {
        self.update_failures
            .lock()
            .unwrap()
            .push_back(message.to_string());
    }
}

#[async_trait]
impl PresenceConnector for ScriptedConnector {
    async fn connect(&self, _app_id: &str) -> PresenceResult<Box<dyn PresenceSession>> {
        self.log.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(Some(message)) = self.connect_script.lock().unwrap().pop_front() {
            return Err(PresenceError::Connect(message));
        }
        Ok(Box::new(ScriptedSession {
            log: Arc::clone(&self.log),
            update_failures: Arc::clone(&self.update_failures),
        }))
    }
}

struct ScriptedSession {
    log: Arc<PresenceLog>,
    update_failures: Arc<Mutex<VecDeque<String>>>,
}

#[async_trait]
impl PresenceSession for ScriptedSession {
    async fn update(&mut self, payload: &PresencePayload) -> PresenceResult<()> {
        if let Some(message) = self.update_failures.lock().unwrap().pop_front() {
            return Err(PresenceError::Update(message));
        }
        self.log.shown.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn clear(&mut self) -> PresenceResult<()> {
        self.log.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) -> PresenceResult<()> {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
