//! Process configuration.
//!
//! Everything the core needs from the environment is read once into a
//! [`Config`] at startup and handed to the components that need it. Nothing
//! in the library reads environment variables on its own after that.
//!
//! | Variable          | Used for                                  |
//! |-------------------|-------------------------------------------|
//! | `DATA_PATH`       | data root; `<DATA_PATH>/cache` holds the response cache |
//! | `OPENAI_API_KEY`  | [`OpenAiProvider`](crate::providers::OpenAiProvider) |
//! | `MISTRAL_API_KEY` | [`MistralProvider`](crate::providers::MistralProvider) |

use std::path::{Path, PathBuf};

use crate::cache::CacheStore;
use crate::{LlmFunctionError, Result};

/// Data root environment variable.
pub const DATA_PATH_VAR: &str = "DATA_PATH";
/// OpenAI credential environment variable.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Mistral credential environment variable.
pub const MISTRAL_API_KEY_VAR: &str = "MISTRAL_API_KEY";

/// Name of the cache directory below the data root.
const CACHE_DIR: &str = "cache";

/// Resolved process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    data_path: PathBuf,
    openai_api_key: Option<String>,
    mistral_api_key: Option<String>,
}

impl Config {
    /// Create a config rooted at `data_path` with no credentials.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            openai_api_key: None,
            mistral_api_key: None,
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// Fails with [`LlmFunctionError::MissingEnvVar`] when `DATA_PATH` is
    /// unset or empty. API keys are optional here and checked when a provider
    /// that needs one is constructed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_path = require_var(&lookup, DATA_PATH_VAR)?;
        Ok(Self {
            data_path: PathBuf::from(data_path),
            openai_api_key: non_empty(lookup(OPENAI_API_KEY_VAR)),
            mistral_api_key: non_empty(lookup(MISTRAL_API_KEY_VAR)),
        })
    }

    /// Set the OpenAI API key.
    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    /// Set the Mistral API key.
    pub fn mistral_api_key(mut self, key: impl Into<String>) -> Self {
        self.mistral_api_key = Some(key.into());
        self
    }

    /// The data root.
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Root directory of the response cache: `<data_path>/cache`.
    pub fn cache_root(&self) -> PathBuf {
        self.data_path.join(CACHE_DIR)
    }

    /// Open a cache namespace below [`cache_root()`](Self::cache_root).
    pub fn cache_store(&self, namespace: &str) -> CacheStore {
        CacheStore::new(self.cache_root(), namespace)
    }

    /// The OpenAI API key, or a `MissingEnvVar` error naming the variable.
    pub fn require_openai_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| LlmFunctionError::MissingEnvVar(OPENAI_API_KEY_VAR.to_string()))
    }

    /// The Mistral API key, or a `MissingEnvVar` error naming the variable.
    pub fn require_mistral_api_key(&self) -> Result<&str> {
        self.mistral_api_key
            .as_deref()
            .ok_or_else(|| LlmFunctionError::MissingEnvVar(MISTRAL_API_KEY_VAR.to_string()))
    }
}

/// Look up a required variable; absent or empty values are an error.
pub fn require_var<F>(lookup: F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup(name)).ok_or_else(|| LlmFunctionError::MissingEnvVar(name.to_string()))
}

/// Read a required variable from the process environment.
pub fn require_env(name: &str) -> Result<String> {
    require_var(|n| std::env::var(n).ok(), name)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
