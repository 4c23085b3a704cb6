// crates/network/src/lib.rs
//! HTTP transport for scraping tracker sites
//!
//! Page fetches are GET-only, carry a per-request timeout and a hard overall
//! deadline, and retry only on 429/500/502/503/504. JSON helpers without retry
//! exist for driving a local WebDriver endpoint.

mod client;
mod error;

pub use client::{Client, ClientConfig, FetchedPage, RETRYABLE_STATUSES};
pub use error::{NetworkError, NetworkResult};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let client = Client::new().expect("Failed to create client");
        let _cloned: Client = client.clone();
        let _: ClientConfig = ClientConfig::default();
    }
}
