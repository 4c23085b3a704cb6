// crates/sync-engine/examples/sync_demo.rs
//! Offline walkthrough of refresh, selection and presence
//!
//! Uses a canned tracker and a console presence channel, so it runs without
//! network access or a Discord client.

use async_trait::async_trait;
use shelfsync_config::{Config, MemoryConfigStore};
use shelfsync_core::{Book, BookKey, BookSet, Platform};
use shelfsync_presence::{PresenceConnector, PresencePayload, PresenceResult, PresenceSession};
use shelfsync_scrapers::{PlatformClient, PlatformClients, ScrapeResult};
use shelfsync_sync_engine::SyncEngine;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

struct CannedShelf;

#[async_trait]
impl PlatformClient for CannedShelf {
    fn platform(&self) -> Platform {
        Platform::Goodreads
    }

    async fn fetch(&self, _config: &Config) -> ScrapeResult<BookSet> {
        let books = vec![
            Book::new(BookKey::new("111")?, "Piranesi", "Susanna Clarke", Platform::Goodreads)
                .with_start_date("Jan 05, 2024"),
            Book::new(BookKey::new("222")?, "The Hobbit", "J.R.R. Tolkien", Platform::Goodreads)
                .with_start_date("March 2024"),
        ];
        Ok(BookSet::from_books(books)?)
    }

    fn profile_url(&self, _config: &Config) -> Option<String> {
        Some("https://www.goodreads.com/user/show/12345".to_string())
    }
}

struct ConsolePresence;

#[async_trait]
impl PresenceConnector for ConsolePresence {
    async fn connect(&self, app_id: &str) -> PresenceResult<Box<dyn PresenceSession>> {
        println!("  [presence] connected as application {}", app_id);
        Ok(Box::new(ConsoleSession))
    }
}

struct ConsoleSession;

#[async_trait]
impl PresenceSession for ConsoleSession {
    async fn update(&mut self, payload: &PresencePayload) -> PresenceResult<()> {
        println!("  [presence] {} / {}", payload.details, payload.state);
        Ok(())
    }

    async fn clear(&mut self) -> PresenceResult<()> {
        println!("  [presence] cleared");
        Ok(())
    }

    async fn close(&mut self) -> PresenceResult<()> {
        println!("  [presence] closed");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    println!("ShelfSync Engine Demo");
    println!("=====================\n");

    let mut config = Config::default();
    config.reading.goodreads_id = "12345".to_string();
    config.presence.discord_app_id = "1234567890".to_string();
    config.presence.update_interval_secs = 5;

    let engine = SyncEngine::new(
        Arc::new(MemoryConfigStore::new(config)),
        PlatformClients::new().with_client(Arc::new(CannedShelf)),
        Arc::new(ConsolePresence),
    )?;

    println!("1. Refresh");
    println!("----------");
    let outcome = engine.refresh_books().await?;
    for book in outcome.books.iter() {
        println!("  {} ({})", book.display_label(), book.key);
    }
    println!("  current: {:?}\n", outcome.current_key.map(|k| k.to_string()));

    println!("2. Selection");
    println!("------------");
    let book = engine.select_book("222")?;
    println!("  ✓ Selected {}", book.display_label());
    if let Err(e) = engine.select_book("999") {
        println!("  ✗ {}\n", e);
    }

    println!("3. Presence");
    println!("-----------");
    engine.start_presence()?;
    tokio::time::sleep(Duration::from_secs(6)).await;
    engine.shutdown().await?;
    println!();

    println!("4. Status log");
    println!("-------------");
    for event in engine.drain_status()? {
        println!("  {}", event);
    }

    Ok(())
}
