//! Admission control for concurrent parse-and-insert sequences.
//!
//! A semaphore caps how many requests run the pipeline at once; the cap
//! bounds peak memory (one push context per slot) and CPU contention.
//! Waiters block asynchronously and are released FIFO-ish by tokio.
//! Dropping a blocked acquire future (request cancellation or timeout)
//! releases nothing it did not take.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tsdbpush_core::error::{IngestError, IngestResult};

/// Concurrency cap for in-flight parse/insert operations.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    timeout: Duration,
}

impl ConcurrencyLimiter {
    pub fn new(max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            timeout,
        }
    }

    /// Wait for an insert slot. Returns a permit released on drop, or a
    /// rate-limit error once the configured wait elapses.
    pub async fn acquire(&self) -> IngestResult<OwnedSemaphorePermit> {
        match tokio::time::timeout(self.timeout, self.semaphore.clone().acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(IngestError::rate_limit("limiter is shut down")),
            Err(_) => Err(IngestError::rate_limit(format!(
                "no insert slot became available within {}ms",
                self.timeout.as_millis()
            ))),
        }
    }

    /// Number of currently free slots.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
