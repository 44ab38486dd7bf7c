//! llm-function - Reusable LLM functions with caching and retry
//!
//! An [`LlmFunction`] packages a prompt template, input/output schemas and an
//! optional fitness function. Providers generate `k` candidate responses per
//! call; each attempt is cached on disk and (for network backends) retried
//! with exponential backoff.
//!
//! # Example
//!
//! ```rust,no_run
//! use llm_function::validate::{ArgSchema, ResponseSchema, validators};
//! use llm_function::{Config, FunctionSchema, LlmFunction, MistralProvider};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> llm_function::Result<()> {
//!     let config = Config::from_env()?;
//!     let provider = MistralProvider::new(&config)?;
//!
//!     let schema = FunctionSchema::new(
//!         ArgSchema::object([("name", ArgSchema::leaf(validators::string()))]),
//!         ResponseSchema::new(),
//!     );
//!     let greet = LlmFunction::build("prompts/greet.md", schema, None, None)?;
//!
//!     for greeting in greet.call(&json!({"name": "Ada"}), &provider, 3).await? {
//!         println!("{greeting}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod function;
pub mod json;
pub mod providers;
#[cfg(feature = "cli")]
pub mod settings;
pub mod telemetry;
pub mod template;
pub mod types;
pub mod validate;

// Re-export main types at crate root
pub use cache::{CacheStore, default_key, make_path_safe, prompt_seed_key};
pub use config::Config;
pub use error::{LlmFunctionError, Result};
pub use function::{Fitness, FunctionSchema, LlmFunction};
pub use json::extract_json;
pub use providers::{
    CompletionEngine, LocalCompletionRequest, LocalModelConfig, LocalProvider, MistralProvider,
    OpenAiProvider, Provider, RetryConfig, with_retry,
};
pub use template::PromptTemplate;
pub use types::{Message, ProviderConfig, Role};
pub use validate::{ArgSchema, ResponseSchema, Validator};
