//! OpenAI chat completions adapter.
//!
//! Attempts run concurrently. Each attempt is retried with backoff around a
//! cache lookup in the `openai_chat_completions` namespace, keyed by
//! [`prompt_seed_key()`](crate::cache::prompt_seed_key).

use async_trait::async_trait;
use futures_util::future::try_join_all;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::http::{ChatCompletionsClient, merge_passthrough};
use super::retry::{RetryConfig, with_retry};
use super::traits::Provider;
use crate::cache::{CacheStore, prompt_seed_key};
use crate::config::Config;
use crate::types::{Message, ProviderConfig};
use crate::Result;

/// Default base URL for the OpenAI API
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Cache namespace for OpenAI completions.
pub const NAMESPACE: &str = "openai_chat_completions";

/// Default `max_tokens` when the config sets no `length`.
const DEFAULT_LENGTH: u32 = 2500;

/// Provider for the OpenAI chat completions API (and compatible servers).
pub struct OpenAiProvider {
    client: ChatCompletionsClient,
    model: String,
    cache: CacheStore,
    retry: RetryConfig,
}

impl OpenAiProvider {
    /// Create a provider for `model` using the key and cache root in `config`.
    ///
    /// Fails if `OPENAI_API_KEY` was not configured.
    pub fn new(config: &Config, model: impl Into<String>) -> Result<Self> {
        let api_key = config.require_openai_api_key()?;
        Ok(Self::with_base_url(
            api_key,
            DEFAULT_BASE_URL,
            model,
            config.cache_store(NAMESPACE),
        ))
    }

    /// Create a provider against a custom base URL (OpenAI-compatible servers, wiremock).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        cache: CacheStore,
    ) -> Self {
        Self {
            client: ChatCompletionsClient::new("openai", api_key, base_url),
            model: model.into(),
            cache,
            retry: RetryConfig::default(),
        }
    }

    /// Replace the retry policy.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Default model for requests whose config names none.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    /// One attempt: retry outside, cache inside.
    async fn run_for_prompt(
        &self,
        prompt: &str,
        seed: u64,
        config: &ProviderConfig,
    ) -> Result<String> {
        let model = config.model.as_deref().unwrap_or(&self.model);

        let mut kwargs = config.attempt_kwargs(prompt)?;
        kwargs.insert("model".to_string(), json!(model));
        kwargs.insert("seed".to_string(), json!(seed));
        let key = prompt_seed_key(&kwargs)?;

        let body = request_body(prompt, model, seed, config);

        with_retry(&self.retry, self.name(), || {
            self.cache
                .get_or_compute(&key, || self.client.complete(&body))
        })
        .await
    }
}

/// Build the JSON request body for one attempt.
fn request_body(prompt: &str, model: &str, seed: u64, config: &ProviderConfig) -> Map<String, Value> {
    let messages = Message::conversation(config.system_prompt.as_deref(), prompt);

    let mut body = Map::new();
    body.insert("model".to_string(), json!(model));
    body.insert("messages".to_string(), json!(messages));
    body.insert(
        "max_tokens".to_string(),
        json!(config.length.unwrap_or(DEFAULT_LENGTH)),
    );
    body.insert("seed".to_string(), json!(seed));
    if let Some(temperature) = config.temperature {
        body.insert("temperature".to_string(), json!(temperature));
    }
    // The schema itself is enforced at validation time.
    if config.wants_json() {
        body.insert(
            "response_format".to_string(),
            json!({ "type": "json_object" }),
        );
    }
    merge_passthrough(&mut body, &config.extra);
    body
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate_responses(
        &self,
        prompt: &str,
        k: usize,
        config: &ProviderConfig,
    ) -> Result<Vec<String>> {
        debug!(provider = self.name(), k, "generating responses");
        let attempts = (0..k as u64).map(|seed| self.run_for_prompt(prompt, seed, config));
        try_join_all(attempts).await
    }
}
