//! Hard deadlines for async operations

use crate::error::{ResilienceError, ResilienceResult};
use std::future::Future;
use std::time::Duration;

/// Runs `operation`, failing with [`ResilienceError::Timeout`] if it outlives `duration`
///
/// The future is dropped at the deadline, so whatever it was waiting on is
/// cancelled rather than left running.
pub async fn with_deadline<F, T>(duration: Duration, operation: F) -> ResilienceResult<T>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, operation)
        .await
        .map_err(|_| ResilienceError::Timeout(duration))
}
