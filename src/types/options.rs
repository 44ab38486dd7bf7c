//! Provider configuration

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

/// Open-ended provider configuration.
///
/// Recognized options are typed fields; everything else lives in `extra` and
/// is forwarded to the backend request unmodified. Serializes to one flat
/// JSON object, which is also what cache keys are derived from.
///
/// The per-attempt seed is always chosen by the adapter (attempt index
/// `0..k`); a `seed`/`random_seed` set here is overridden.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Maximum output tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Backend model identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Structural constraint on the output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<Value>,
    /// Ask for a JSON object response without a schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,

    // Passed through to the backend as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn json_schema(mut self, schema: Value) -> Self {
        self.json_schema = Some(schema);
        self
    }

    pub fn json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = Some(enabled);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set an option the crate does not interpret.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Whether the backend should be asked for JSON output.
    pub fn wants_json(&self) -> bool {
        self.json_schema.is_some() || self.json_mode.unwrap_or(false)
    }

    /// Keyword arguments of one attempt for cache-key derivation: the flat
    /// config without configured seeds, plus `prompt`.
    pub(crate) fn attempt_kwargs(&self, prompt: &str) -> Result<Map<String, Value>> {
        let mut kwargs = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        kwargs.remove("seed");
        kwargs.remove("random_seed");
        kwargs.insert("prompt".to_string(), Value::String(prompt.to_string()));
        Ok(kwargs)
    }
}
