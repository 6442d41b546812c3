//! Bounded retry with exponential backoff for outbound requests
//!
//! Client errors (HTTP 4xx) are never retried: a renamed repository or a bad
//! locator will not fix itself between attempts. Everything else (5xx,
//! connection failures, malformed bodies) is retried until the attempt budget
//! runs out, and the last error is returned. There is no jitter.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::{
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_RETRY_DELAY_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_RETRY_DELAY_MS,
};

/// Errors that may carry the HTTP status of the response that caused them
pub trait RetryableError: Display {
    fn http_status(&self) -> Option<u16>;

    /// Whether this error is a 4xx client error and must not be retried
    fn is_client_error(&self) -> bool {
        matches!(self.http_status(), Some(400..=499))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_RETRY_DELAY_MS),
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_delay: Duration::from_millis(DEFAULT_MAX_RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after `delay` has been used, capped at `max_delay`
    fn next_delay(&self, delay: Duration) -> Duration {
        let next = delay.as_secs_f64() * self.backoff_multiplier;
        if next.is_finite() && (0.0..self.max_delay.as_secs_f64()).contains(&next) {
            Duration::from_secs_f64(next)
        } else {
            self.max_delay
        }
    }
}

/// Run `op` until it succeeds, fails with a client error, or the policy's
/// attempt budget is used up.
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if err.is_client_error() => {
                debug!(attempt, error = %err, "Client error is not retryable, failing immediately");
                return Err(err);
            }
            Err(err) if attempt >= max_attempts => {
                warn!(attempts = attempt, error = %err, "Operation failed after maximum retries");
                return Err(err);
            }
            Err(err) => {
                warn!(
                    attempt,
                    max_attempts,
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "Operation failed, retrying"
                );
                sleep(delay).await;
                delay = policy.next_delay(delay);
                attempt += 1;
            }
        }
    }
}
