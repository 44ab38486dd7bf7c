//! Retry with exponential backoff.
//!
//! [`with_retry()`] wraps one fallible async operation. Every error is
//! retried until the budget runs out; there is no split between transient
//! and permanent failures. The delay doubles after each failure, starting at
//! [`RetryConfig::initial_delay`], with no jitter and no cap.
//!
//! Adapters apply it per generation attempt, outside the cache lookup, so a
//! cache entry is only written after an attempt succeeds.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::Result;
use crate::telemetry;

/// Configuration for retry behaviour.
///
/// ```rust
/// # use llm_function::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_retries(3)
///     .initial_delay(Duration::from_millis(200));
/// assert_eq!(config.total_attempts(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt. 0 = no retry. Default: 5.
    pub max_retries: u32,
    /// Delay before the first retry. Default: 5s.
    pub initial_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    /// Create a new config with the defaults (5 retries, 5s initial delay).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set the number of retries after the first attempt.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Attempts made before giving up: `max_retries + 1`.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (1-indexed): `initial_delay * 2^(retry - 1)`.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(exponent))
    }
}

/// Execute an async operation, retrying every failure with exponential backoff.
///
/// Makes at most `config.max_retries + 1` attempts. The error from the last
/// attempt is returned once the budget is spent.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, provider_name: &str, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries = 0u32;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if retries >= config.max_retries => {
                warn!(
                    provider = provider_name,
                    attempts = retries + 1,
                    error = %e,
                    "giving up after retries"
                );
                return Err(e);
            }
            Err(e) => {
                retries += 1;
                let delay = config.delay_for_retry(retries);
                metrics::counter!(telemetry::RETRIES_TOTAL, "provider" => provider_name.to_owned())
                    .increment(1);
                warn!(
                    provider = provider_name,
                    retry = retries,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "error encountered, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
