//! Retry policy with exponential backoff
//!
//! Bounded retry for whole pipeline runs:
//! - Default: a single attempt (no retry)
//! - Strategy: binary exponential with ±25% jitter, capped
//! - Only transient provider failures are retried

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::errors::{RagError, Result};

/// Base delay for exponential backoff (2 seconds)
const BASE_DELAY_MS: u64 = 2000;

/// Maximum delay cap (16 seconds)
const MAX_DELAY_MS: u64 = 16000;

/// Retry policy for pipeline runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Base delay in milliseconds
    pub base_delay_ms: u64,

    /// Maximum delay cap in milliseconds
    pub max_delay_ms: u64,

    /// Enable jitter
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// Single attempt, failures surface immediately
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: BASE_DELAY_MS,
            max_delay_ms: MAX_DELAY_MS,
            jitter: true,
        }
    }

    /// Retry transient failures up to `max_attempts` total attempts
    pub fn with_attempts(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            max_delay_ms: MAX_DELAY_MS,
            jitter: true,
        }
    }

    /// Execute operation, retrying errors for which [`RagError::is_retryable`] holds
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;

                    if !e.is_retryable() || attempt >= self.max_attempts.max(1) {
                        return Err(e);
                    }

                    let delay = self.calculate_delay(attempt - 1);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// Delay before retry number `retry` (0-based)
    fn calculate_delay(&self, retry: u32) -> Duration {
        let exponential_delay = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(retry));
        let delay_ms = exponential_delay.min(self.max_delay_ms);

        let final_delay = if self.jitter {
            let jitter = (delay_ms / 4) as i64;
            let random_jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter as f64;
            ((delay_ms as i64) + random_jitter as i64).max(0) as u64
        } else {
            delay_ms
        };

        Duration::from_millis(final_delay)
    }

    /// Upper bound of time spent sleeping between attempts (without jitter)
    pub fn max_total_wait_time(&self) -> Duration {
        let total_ms: u64 = (0..self.max_attempts.saturating_sub(1))
            .map(|retry| {
                self.base_delay_ms
                    .saturating_mul(2u64.saturating_pow(retry))
                    .min(self.max_delay_ms)
            })
            .sum();

        Duration::from_millis(total_ms)
    }
}
