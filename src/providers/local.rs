//! Local in-process model adapter.
//!
//! Inference is compute-bound and serializes on one loaded model, so the `k`
//! attempts run one after another, each on tokio's blocking pool. Results are
//! cached in the `llama_cpp_chat_completions` namespace keyed by
//! [`prompt_seed_key()`](crate::cache::prompt_seed_key) over the attempt
//! arguments plus the model path, so different models never share entries.
//! There is no retry: a local failure is not transient.
//!
//! The model runtime itself is pluggable through [`CompletionEngine`]; a
//! llama.cpp binding, a candle model or a test double all fit behind it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use super::traits::Provider;
use crate::cache::{CacheStore, prompt_seed_key};
use crate::config::Config;
use crate::types::{Message, ProviderConfig};
use crate::{LlmFunctionError, Result};

/// Cache namespace for local completions.
pub const NAMESPACE: &str = "llama_cpp_chat_completions";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";
const DEFAULT_LENGTH: u32 = 2000;
const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Parameters for loading a local model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalModelConfig {
    /// Path to the model weights.
    pub model_path: PathBuf,
    /// Context window in tokens. Default: 1024.
    pub n_ctx: u32,
    /// Layers to offload to the GPU; -1 = all. Default: -1.
    pub n_gpu_layers: i32,
    /// Chat template name. Default: "chatml".
    pub chat_format: String,
    /// Engine logging. Default: false.
    pub verbose: bool,
    /// Engine-specific load options.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl LocalModelConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            n_ctx: 1024,
            n_gpu_layers: -1,
            chat_format: "chatml".to_string(),
            verbose: false,
            extra: Map::new(),
        }
    }

    pub fn n_ctx(mut self, n_ctx: u32) -> Self {
        self.n_ctx = n_ctx;
        self
    }

    pub fn n_gpu_layers(mut self, layers: i32) -> Self {
        self.n_gpu_layers = layers;
        self
    }

    pub fn chat_format(mut self, format: impl Into<String>) -> Self {
        self.chat_format = format.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// One chat completion request for a local engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalCompletionRequest {
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub seed: u64,
    /// `{"type": "json_object", "schema": …}` when a JSON schema was configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
    /// Unrecognized provider-config options.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl LocalCompletionRequest {
    fn from_config(prompt: &str, seed: u64, config: &ProviderConfig) -> Self {
        let system_prompt = config
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT);
        Self {
            messages: Message::conversation(Some(system_prompt), prompt),
            temperature: config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: config.length.unwrap_or(DEFAULT_LENGTH),
            seed,
            response_format: config
                .json_schema
                .as_ref()
                .map(|schema| json!({ "type": "json_object", "schema": schema })),
            extra: config.extra.clone(),
        }
    }
}

/// A loaded in-process model.
///
/// `create_chat_completion` blocks; the adapter calls it from the blocking
/// pool and never concurrently with itself.
pub trait CompletionEngine: Send + Sync + 'static {
    /// Load the model described by `config`.
    fn load(config: &LocalModelConfig) -> Result<Self>
    where
        Self: Sized;

    /// Run one completion and return the assistant message content.
    fn create_chat_completion(&self, request: &LocalCompletionRequest) -> Result<String>;
}

/// Provider backed by a [`CompletionEngine`].
pub struct LocalProvider<E> {
    engine: Arc<E>,
    model_path: PathBuf,
    cache: CacheStore,
}

impl<E: CompletionEngine> LocalProvider<E> {
    /// Load the model and cache under the root in `config`.
    pub fn load(model: &LocalModelConfig, config: &Config) -> Result<Self> {
        debug!(model_path = %model.model_path.display(), n_ctx = model.n_ctx, "loading local model");
        let engine = E::load(model)?;
        Ok(Self::with_engine(
            engine,
            &model.model_path,
            config.cache_store(NAMESPACE),
        ))
    }

    /// Wrap an already loaded engine. `model_path` identifies the model in
    /// cache keys.
    pub fn with_engine(engine: E, model_path: impl Into<PathBuf>, cache: CacheStore) -> Self {
        Self {
            engine: Arc::new(engine),
            model_path: model_path.into(),
            cache,
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    async fn run_for_prompt(
        &self,
        prompt: &str,
        seed: u64,
        config: &ProviderConfig,
    ) -> Result<String> {
        let mut kwargs = config.attempt_kwargs(prompt)?;
        kwargs.insert(
            "model_path".to_string(),
            json!(self.model_path.to_string_lossy()),
        );
        kwargs.insert("seed".to_string(), json!(seed));
        let key = prompt_seed_key(&kwargs)?;

        let request = LocalCompletionRequest::from_config(prompt, seed, config);
        let engine = Arc::clone(&self.engine);

        self.cache
            .get_or_compute(&key, || async move {
                tokio::task::spawn_blocking(move || engine.create_chat_completion(&request))
                    .await
                    .map_err(|e| LlmFunctionError::Inference(e.to_string()))?
            })
            .await
    }
}

#[async_trait]
impl<E: CompletionEngine> Provider for LocalProvider<E> {
    fn name(&self) -> &str {
        "local"
    }

    async fn generate_responses(
        &self,
        prompt: &str,
        k: usize,
        config: &ProviderConfig,
    ) -> Result<Vec<String>> {
        debug!(provider = self.name(), k, "generating responses sequentially");
        let mut responses = Vec::with_capacity(k);
        for seed in 0..k as u64 {
            responses.push(self.run_for_prompt(prompt, seed, config).await?);
        }
        Ok(responses)
    }
}
