use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use llm_function::providers::retry::{RetryConfig, with_retry};
use llm_function::{LlmFunctionError, Result};
use tokio::time::Instant;

/// Operation that fails N times then succeeds.
struct FailThenSucceed {
    remaining: AtomicU32,
    calls: AtomicU32,
}

impl FailThenSucceed {
    fn new(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            remaining: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
        })
    }

    async fn call(&self) -> Result<&'static str> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.remaining.load(Ordering::SeqCst) > 0 {
            self.remaining.fetch_sub(1, Ordering::SeqCst);
            return Err(LlmFunctionError::Http("connection reset".into()));
        }
        Ok("ok")
    }

    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[test]
fn default_config_values() {
    let config = RetryConfig::default();
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.initial_delay, Duration::from_secs(5));
    assert_eq!(config.total_attempts(), 6);
}

#[tokio::test(start_paused = true)]
async fn always_failing_makes_r_plus_one_attempts() {
    let op = FailThenSucceed::new(u32::MAX);
    let config = RetryConfig::new()
        .max_retries(3)
        .initial_delay(Duration::from_millis(100));

    let start = Instant::now();
    let result = with_retry(&config, "test", || op.call()).await;

    assert!(matches!(result, Err(LlmFunctionError::Http(_))));
    assert_eq!(op.call_count(), 4);
    // 100 + 200 + 400
    assert_eq!(start.elapsed(), Duration::from_millis(700));
}

#[tokio::test(start_paused = true)]
async fn total_delay_is_geometric() {
    for retries in 0..5u32 {
        let op = FailThenSucceed::new(u32::MAX);
        let config = RetryConfig::new()
            .max_retries(retries)
            .initial_delay(Duration::from_secs(1));

        let start = Instant::now();
        let _ = with_retry(&config, "test", || op.call()).await;

        assert_eq!(op.call_count(), retries + 1);
        let expected = Duration::from_secs((1u64 << retries) - 1);
        assert_eq!(start.elapsed(), expected, "retries = {retries}");
    }
}

#[tokio::test(start_paused = true)]
async fn succeeds_after_transient_failures() {
    let op = FailThenSucceed::new(2);
    let config = RetryConfig::new().initial_delay(Duration::from_millis(10));

    let start = Instant::now();
    let result = with_retry(&config, "test", || op.call()).await.unwrap();

    assert_eq!(result, "ok");
    assert_eq!(op.call_count(), 3);
    assert_eq!(start.elapsed(), Duration::from_millis(30));
}

#[tokio::test(start_paused = true)]
async fn every_error_kind_is_retried() {
    let errors: Vec<fn() -> LlmFunctionError> = vec![
        || LlmFunctionError::AuthenticationFailed,
        || LlmFunctionError::Api {
            status: 400,
            message: "bad request".into(),
        },
        || LlmFunctionError::RateLimited {
            retry_after: Some(Duration::from_secs(600)),
        },
        || LlmFunctionError::EmptyResponse,
    ];
    for make_error in errors {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new()
            .max_retries(2)
            .initial_delay(Duration::from_millis(1));
        let result: Result<()> = with_retry(&config, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(make_error()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}

#[tokio::test]
async fn disabled_retry_calls_once() {
    let op = FailThenSucceed::new(1);
    let result = with_retry(&RetryConfig::disabled(), "test", || op.call()).await;
    assert!(result.is_err());
    assert_eq!(op.call_count(), 1);
}
