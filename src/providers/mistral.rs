//! Mistral chat completions adapter.
//!
//! Same fan-out and retry-around-cache composition as the OpenAI adapter.
//! The attempt index is sent as `random_seed`, and cache keys hash the whole
//! argument set with [`default_key()`](crate::cache::default_key).

use async_trait::async_trait;
use futures_util::future::try_join_all;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::http::{ChatCompletionsClient, merge_passthrough};
use super::retry::{RetryConfig, with_retry};
use super::traits::Provider;
use crate::cache::{CacheStore, default_key};
use crate::config::Config;
use crate::types::{Message, ProviderConfig};
use crate::Result;

/// Default base URL for the Mistral API
const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";

/// Cache namespace for Mistral completions.
pub const NAMESPACE: &str = "mistral_chat_completions";

const DEFAULT_MODEL: &str = "mistral-large-latest";
const DEFAULT_LENGTH: u32 = 2000;

/// Provider for the Mistral chat completions API.
pub struct MistralProvider {
    client: ChatCompletionsClient,
    cache: CacheStore,
    retry: RetryConfig,
}

impl MistralProvider {
    /// Create a provider using the key and cache root in `config`.
    ///
    /// Fails if `MISTRAL_API_KEY` was not configured.
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.require_mistral_api_key()?;
        Ok(Self::with_base_url(
            api_key,
            DEFAULT_BASE_URL,
            config.cache_store(NAMESPACE),
        ))
    }

    /// Create a provider against a custom base URL (for testing with wiremock).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        cache: CacheStore,
    ) -> Self {
        Self {
            client: ChatCompletionsClient::new("mistral", api_key, base_url),
            cache,
            retry: RetryConfig::default(),
        }
    }

    /// Replace the retry policy.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    async fn run_for_prompt(
        &self,
        prompt: &str,
        random_seed: u64,
        config: &ProviderConfig,
    ) -> Result<String> {
        let mut kwargs = config.attempt_kwargs(prompt)?;
        kwargs.insert("random_seed".to_string(), json!(random_seed));
        let key = default_key(&[] as &[Value], &kwargs)?;

        let body = request_body(prompt, random_seed, config);

        with_retry(&self.retry, self.name(), || {
            self.cache
                .get_or_compute(&key, || self.client.complete(&body))
        })
        .await
    }
}

fn request_body(prompt: &str, random_seed: u64, config: &ProviderConfig) -> Map<String, Value> {
    let messages = Message::conversation(config.system_prompt.as_deref(), prompt);

    let mut body = Map::new();
    body.insert(
        "model".to_string(),
        json!(config.model.as_deref().unwrap_or(DEFAULT_MODEL)),
    );
    body.insert("messages".to_string(), json!(messages));
    body.insert(
        "max_tokens".to_string(),
        json!(config.length.unwrap_or(DEFAULT_LENGTH)),
    );
    body.insert("random_seed".to_string(), json!(random_seed));
    body.insert("safe_prompt".to_string(), json!(false));
    if let Some(temperature) = config.temperature {
        body.insert("temperature".to_string(), json!(temperature));
    }
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
impl Provider for MistralProvider {
    fn name(&self) -> &str {
        "mistral"
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
