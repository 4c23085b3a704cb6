// crates/sync-engine/src/cache.rs
//! TTL cache of fetched book sets, one entry per platform

use crate::error::{EngineError, EngineResult};
use shelfsync_config::Config;
use shelfsync_core::{BookSet, Platform};
use shelfsync_scrapers::PlatformClient;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

struct CacheEntry {
    fetched_at: Instant,
    books: BookSet,
}

/// Result of a cache lookup
#[derive(Debug, Clone)]
pub struct Fetched {
    pub books: BookSet,
    /// Served without contacting the platform
    pub from_cache: bool,
}

/// Memoizes the last successful fetch of each platform
///
/// The lock guards only the map; the fetch itself runs unlocked. Concurrent
/// misses for the same platform both fetch unless the caller serializes them.
#[derive(Default)]
pub struct BookCache {
    entries: Mutex<HashMap<Platform, CacheEntry>>,
}

impl BookCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached set when fresh, otherwise fetches and stores it
    ///
    /// Empty results and failures are not cached, and a failure drops any
    /// stale entry for the platform.
    pub async fn get_or_fetch(
        &self,
        client: &dyn PlatformClient,
        config: &Config,
        ttl: Duration,
    ) -> EngineResult<Fetched> {
        let platform = client.platform();

        if let Some(books) = self.fresh(platform, ttl)? {
            log::debug!("Serving {} book(s) for {} from cache", books.len(), platform);
            return Ok(Fetched {
                books,
                from_cache: true,
            });
        }

        let result = client.fetch(config).await;

        let mut entries = self.entries.lock().map_err(|_| EngineError::LockPoisoned)?;
        match result {
            Ok(books) => {
                if books.is_empty() {
                    entries.remove(&platform);
                } else {
                    entries.insert(
                        platform,
                        CacheEntry {
                            fetched_at: Instant::now(),
                            books: books.clone(),
                        },
                    );
                }
                Ok(Fetched {
                    books,
                    from_cache: false,
                })
            }
            Err(e) => {
                entries.remove(&platform);
                Err(e.into())
            }
        }
    }

    fn fresh(&self, platform: Platform, ttl: Duration) -> EngineResult<Option<BookSet>> {
        let entries = self.entries.lock().map_err(|_| EngineError::LockPoisoned)?;
        Ok(entries
            .get(&platform)
            .filter(|entry| entry.fetched_at.elapsed() < ttl && !entry.books.is_empty())
            .map(|entry| entry.books.clone()))
    }

    /// Drops every entry so the next lookup always fetches
    pub fn invalidate(&self) -> EngineResult<()> {
        self.entries
            .lock()
            .map_err(|_| EngineError::LockPoisoned)?
            .clear();
        Ok(())
    }

    /// Drops the entry of one platform, leaving the others cached
    pub fn invalidate_platform(&self, platform: Platform) -> EngineResult<()> {
        self.entries
            .lock()
            .map_err(|_| EngineError::LockPoisoned)?
            .remove(&platform);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shelfsync_core::{Book, BookKey};
    use shelfsync_scrapers::{ScrapeError, ScrapeResult};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct CountingClient {
        platform: Platform,
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingClient {
        fn new(platform: Platform) -> Self {
            Self {
                platform,
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PlatformClient for CountingClient {
        fn platform(&self) -> Platform {
            self.platform
        }

        async fn fetch(&self, _config: &Config) -> ScrapeResult<BookSet> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(ScrapeError::Parse("boom".to_string()));
            }
            let book = Book::new(BookKey::new("111").unwrap(), "T", "A", self.platform);
            Ok(BookSet::from_books(vec![book]).unwrap())
        }

        fn profile_url(&self, _config: &Config) -> Option<String> {
            None
        }
    }

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test(start_paused = true)]
    async fn test_fetches_once_per_ttl_window() {
        let cache = BookCache::new();
        let client = CountingClient::new(Platform::Goodreads);
        let config = Config::default();

        let first = cache.get_or_fetch(&client, &config, TTL).await.unwrap();
        assert!(!first.from_cache);

        tokio::time::advance(Duration::from_secs(299)).await;
        let second = cache.get_or_fetch(&client, &config, TTL).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(client.calls(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        let third = cache.get_or_fetch(&client, &config, TTL).await.unwrap();
        assert!(!third.from_cache);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_platforms_cached_independently() {
        let cache = BookCache::new();
        let goodreads = CountingClient::new(Platform::Goodreads);
        let storygraph = CountingClient::new(Platform::StoryGraph);
        let config = Config::default();

        cache.get_or_fetch(&goodreads, &config, TTL).await.unwrap();
        cache.get_or_fetch(&storygraph, &config, TTL).await.unwrap();
        cache.get_or_fetch(&goodreads, &config, TTL).await.unwrap();
        cache.get_or_fetch(&storygraph, &config, TTL).await.unwrap();

        assert_eq!(goodreads.calls(), 1);
        assert_eq!(storygraph.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_refetch() {
        let cache = BookCache::new();
        let client = CountingClient::new(Platform::Goodreads);
        let config = Config::default();

        cache.get_or_fetch(&client, &config, TTL).await.unwrap();
        cache.invalidate().unwrap();
        cache.get_or_fetch(&client, &config, TTL).await.unwrap();
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_platform_keeps_others() {
        let cache = BookCache::new();
        let goodreads = CountingClient::new(Platform::Goodreads);
        let storygraph = CountingClient::new(Platform::StoryGraph);
        let config = Config::default();

        cache.get_or_fetch(&goodreads, &config, TTL).await.unwrap();
        cache.get_or_fetch(&storygraph, &config, TTL).await.unwrap();
        cache.invalidate_platform(Platform::Goodreads).unwrap();

        assert!(!cache.get_or_fetch(&goodreads, &config, TTL).await.unwrap().from_cache);
        assert!(cache.get_or_fetch(&storygraph, &config, TTL).await.unwrap().from_cache);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_drops_entry() {
        let cache = BookCache::new();
        let client = CountingClient::new(Platform::Goodreads);
        let config = Config::default();

        cache.get_or_fetch(&client, &config, TTL).await.unwrap();
        tokio::time::advance(TTL).await;

        client.fail.store(true, Ordering::SeqCst);
        assert!(cache.get_or_fetch(&client, &config, TTL).await.is_err());

        client.fail.store(false, Ordering::SeqCst);
        let next = cache.get_or_fetch(&client, &config, TTL).await.unwrap();
        assert!(!next.from_cache);
        assert_eq!(client.calls(), 3);
    }
}
