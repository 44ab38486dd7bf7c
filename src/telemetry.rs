//! Telemetry metric name constants.
//!
//! Consumers install their own `metrics` recorder (e.g. prometheus, statsd);
//! without a recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `llm_function_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `namespace`: cache namespace (e.g. "openai_chat_completions")
//! - `provider`: provider name (e.g. "openai", "mistral", "local")
//! - `status`: outcome: "ok" or "error"

/// Total backend requests issued on cache misses.
///
/// Labels: `provider`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "llm_function_requests_total";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`.
pub const RETRIES_TOTAL: &str = "llm_function_retries_total";

/// Total disk cache hits.
///
/// Labels: `namespace`.
pub const CACHE_HITS_TOTAL: &str = "llm_function_cache_hits_total";

/// Total disk cache misses.
///
/// Labels: `namespace`.
pub const CACHE_MISSES_TOTAL: &str = "llm_function_cache_misses_total";

/// Candidate responses dropped by response validation.
///
/// Labels: `provider`.
pub const RESPONSES_REJECTED_TOTAL: &str = "llm_function_responses_rejected_total";
