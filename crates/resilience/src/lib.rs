//! Resilience patterns for talking to flaky tracker sites
//!
//! - Retry with exponential backoff, gated by a caller-supplied predicate
//! - Hard deadlines around whole operations, independent of retry count
//!
//! # Example
//!
//! ```rust
//! use shelfsync_resilience::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(3)
//!     .with_initial_delay(Duration::from_millis(250))
//!     .with_jitter(false);
//! assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(500));
//! ```

mod error;
mod retry;
mod timeout;

pub use error::{ResilienceError, ResilienceResult};
pub use retry::{retry_async, RetryPolicy};
pub use timeout::with_deadline;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let _: RetryPolicy = RetryPolicy::default();
    }
}
