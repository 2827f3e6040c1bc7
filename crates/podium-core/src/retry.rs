// Bounded retry with exponential backoff, shared by page fetches and avatar
// downloads.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::config::RetryConfig;
use crate::error::LoadError;

/// `max_failed_attempts` counts invocations, so the operation runs at most
/// that many times. The wait after the n-th failure is
/// `initial_delay * 2^(n-1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_failed_attempts: u32,
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_failed_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_failed_attempts: max_failed_attempts.max(1),
            initial_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_failed_connection_attempts, config.initial_delay())
    }

    /// Wait before retry number `n` (1-based).
    pub fn delay_for_retry(&self, n: u32) -> Duration {
        let exponent = n.saturating_sub(1).min(31);
        self.initial_delay.saturating_mul(1u32 << exponent)
    }

    /// Run `op` until it succeeds or the budget is spent. The terminal error
    /// is always `RetriesExhausted` wrapping the last failure.
    pub async fn execute<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, LoadError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LoadError>>,
    {
        let mut failures = 0u32;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            failures += 1;

            if failures >= self.max_failed_attempts {
                error!(
                    op = label,
                    attempts = failures,
                    kind = err.kind(),
                    error = %err,
                    "giving up"
                );
                return Err(LoadError::RetriesExhausted {
                    attempts: failures,
                    last: Box::new(err),
                });
            }

            let delay = self.delay_for_retry(failures);
            warn!(
                op = label,
                attempt = failures,
                max = self.max_failed_attempts,
                retry_in_ms = delay.as_millis() as u64,
                kind = err.kind(),
                error = %err,
                "load attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
