//! The capability every tracker client provides

use crate::ScrapeResult;
use async_trait::async_trait;
use shelfsync_config::Config;
use shelfsync_core::{BookSet, Platform};

/// A reading tracker that can list the user's currently-reading books
///
/// Implementations do no shared-state mutation; they return a fresh
/// [`BookSet`] or a failure. Every book in the set is tagged with
/// [`PlatformClient::platform`].
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Which platform this client scrapes
    fn platform(&self) -> Platform;

    /// Fetches and parses the currently-reading listing
    ///
    /// # Errors
    ///
    /// - [`crate::ScrapeError::NotConfigured`] when the identifier is blank
    /// - [`crate::ScrapeError::Fetch`] on network failure or non-2xx
    /// - [`crate::ScrapeError::Parse`] when the listing structure is absent
    /// - [`crate::ScrapeError::AuthRequired`] on a login redirect
    async fn fetch(&self, config: &Config) -> ScrapeResult<BookSet>;

    /// Link to the user's public page, used for the presence button
    fn profile_url(&self, config: &Config) -> Option<String>;
}
