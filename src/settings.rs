//! Settings file for the `llmfn` CLI.
//!
//! Resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.config/llm-function/config.toml` (user)
//!
//! Without a file the CLI runs from environment variables alone. Credentials
//! are never read from the file.
//!
//! ```toml
//! data_path = "/srv/llm-data"
//!
//! [providers.openai]
//! model = "gpt-4o-mini"
//!
//! [providers.mistral]
//! base_url = "http://localhost:8080/v1"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::{Config, DATA_PATH_VAR};
use crate::{LlmFunctionError, Result};

/// Parsed settings file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Data root; takes precedence over `DATA_PATH`.
    pub data_path: Option<PathBuf>,
    #[serde(default)]
    pub providers: ProvidersSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersSettings {
    pub openai: Option<ProviderSettings>,
    pub mistral: Option<ProviderSettings>,
}

/// Per-provider defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderSettings {
    pub model: Option<String>,
    pub base_url: Option<String>,
}

impl Settings {
    /// Load settings from the standard locations.
    ///
    /// An explicit path must exist. With no explicit path and no user file
    /// the result is `None`.
    pub fn load(explicit_path: Option<&Path>) -> Result<Option<Self>> {
        match Self::resolve_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path).map(Some),
            None => Ok(None),
        }
    }

    /// Parse one settings file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            LlmFunctionError::Configuration(format!("Failed to read settings file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            LlmFunctionError::Configuration(format!("Failed to parse settings file {path:?}: {e}"))
        })
    }

    fn resolve_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(LlmFunctionError::Configuration(format!(
                "Settings file not found: {path:?}"
            )));
        }

        Ok(Self::user_path().filter(|path| path.exists()))
    }

    /// `~/.config/llm-function/config.toml` on Linux; the platform config dir elsewhere.
    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("llm-function").join("config.toml"))
    }

    /// Build a [`Config`] from `lookup`, with `data_path` from these settings
    /// taking precedence over `DATA_PATH`.
    pub fn config<F>(&self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_path = self
            .data_path
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned());
        Config::from_lookup(|name| {
            if name == DATA_PATH_VAR && data_path.is_some() {
                data_path.clone()
            } else {
                lookup(name)
            }
        })
    }

    pub fn openai(&self) -> ProviderSettings {
        self.providers.openai.clone().unwrap_or_default()
    }

    pub fn mistral(&self) -> ProviderSettings {
        self.providers.mistral.clone().unwrap_or_default()
    }
}
