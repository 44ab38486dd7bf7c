//! LLM functions.
//!
//! An [`LlmFunction`] packages a prompt template, an argument schema, a
//! response schema and an optional fitness function. Calling it validates the
//! arguments, renders the prompt, asks a [`Provider`] for `k` candidates and
//! returns the candidates that pass response validation, best first when a
//! fitness function is set.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use llm_function::validate::{ArgSchema, ResponseSchema, validators};
//! use llm_function::{Config, Fitness, FunctionSchema, LlmFunction, OpenAiProvider};
//! use serde_json::json;
//!
//! # async fn run() -> llm_function::Result<()> {
//! let schema = FunctionSchema::new(
//!     ArgSchema::object([("topic", ArgSchema::leaf(validators::string()))]),
//!     ResponseSchema::new().json_schema(json!({
//!         "type": "object",
//!         "properties": {"title": {"type": "string"}},
//!         "required": ["title"]
//!     }))?,
//! );
//! let fitness: Fitness =
//!     Arc::new(|v: &serde_json::Value| v["title"].as_str().map_or(0.0, |t| t.len() as f64));
//! let title = LlmFunction::build("prompts/title.md", schema, Some(fitness), None)?;
//!
//! let provider = OpenAiProvider::new(&Config::from_env()?, "gpt-4o-mini")?;
//! let titles = title.call(&json!({"topic": "ferrets"}), &provider, 5).await?;
//! # Ok(())
//! # }
//! ```

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use metrics::counter;
use serde_json::Value;
use tracing::{debug, error};

use crate::providers::Provider;
use crate::telemetry;
use crate::template::PromptTemplate;
use crate::types::ProviderConfig;
use crate::validate::{ArgSchema, ResponseSchema};
use crate::Result;

/// Scores a validated response; higher is better.
pub type Fitness = Arc<dyn Fn(&Value) -> f64 + Send + Sync>;

/// Input and output schema of an LLM function.
#[derive(Debug, Clone)]
pub struct FunctionSchema {
    pub args: ArgSchema,
    pub response: ResponseSchema,
}

impl FunctionSchema {
    pub fn new(args: ArgSchema, response: ResponseSchema) -> Self {
        Self { args, response }
    }
}

/// A prompt template bound to its schemas and provider options.
pub struct LlmFunction {
    template: PromptTemplate,
    schema: FunctionSchema,
    fitness: Option<Fitness>,
    provider_config: ProviderConfig,
}

impl std::fmt::Debug for LlmFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmFunction")
            .field("template", &self.template)
            .field("schema", &self.schema)
            .field("fitness", &self.fitness.as_ref().map(|_| "<fn>"))
            .field("provider_config", &self.provider_config)
            .finish()
    }
}

impl LlmFunction {
    /// Load the template at `template_path` and bind it.
    ///
    /// Fails if the template is missing or does not parse.
    pub fn build(
        template_path: impl AsRef<Path>,
        schema: FunctionSchema,
        fitness: Option<Fitness>,
        provider_config: Option<ProviderConfig>,
    ) -> Result<Self> {
        let template = PromptTemplate::load(template_path)?;
        Ok(Self::from_template(
            template,
            schema,
            fitness,
            provider_config,
        ))
    }

    /// Bind an already parsed template.
    ///
    /// A JSON schema on the response is copied into the provider config so
    /// backends can ask for structured output.
    pub fn from_template(
        template: PromptTemplate,
        schema: FunctionSchema,
        fitness: Option<Fitness>,
        provider_config: Option<ProviderConfig>,
    ) -> Self {
        let mut provider_config = provider_config.unwrap_or_default();
        if let Some(json_schema) = schema.response.schema() {
            provider_config.json_schema = Some(json_schema.clone());
        }
        debug!(
            template = ?template.path(),
            config = ?provider_config,
            "built LLM function"
        );
        Self {
            template,
            schema,
            fitness,
            provider_config,
        }
    }

    pub fn provider_config(&self) -> &ProviderConfig {
        &self.provider_config
    }

    pub fn schema(&self) -> &FunctionSchema {
        &self.schema
    }

    /// Validate `args` and render the prompt.
    pub fn render(&self, args: &Value) -> Result<String> {
        let args = self.schema.args.validate(args)?;
        self.template.render(&args)
    }

    /// Generate `k` candidates with `provider` and return the valid ones.
    ///
    /// An invalid argument or a provider failure is an error. Invalid
    /// candidates are dropped, so the result may be empty.
    pub async fn call<P: Provider + ?Sized>(
        &self,
        args: &Value,
        provider: &P,
        k: usize,
    ) -> Result<Vec<Value>> {
        let prompt = self.render(args)?;
        let raw = provider
            .generate_responses(&prompt, k, &self.provider_config)
            .await?;
        self.select(provider.name(), raw)
    }

    /// Blocking form of [`call()`](Self::call).
    ///
    /// Must not be called from inside an async context.
    pub fn call_blocking<P: Provider + ?Sized>(
        &self,
        args: &Value,
        provider: &P,
        k: usize,
    ) -> Result<Vec<Value>> {
        let prompt = self.render(args)?;
        let raw = provider.sync_generate_responses(&prompt, k, &self.provider_config)?;
        self.select(provider.name(), raw)
    }

    /// Validate raw candidates and rank the survivors.
    fn select(&self, provider: &str, raw: Vec<String>) -> Result<Vec<Value>> {
        let mut valid = Vec::with_capacity(raw.len());
        for (index, response) in raw.iter().enumerate() {
            match self.schema.response.validate(response) {
                Ok(value) => valid.push(value),
                Err(e) if e.is_validation() => {
                    error!(provider, index, error = %e, "discarding invalid response");
                    counter!(telemetry::RESPONSES_REJECTED_TOTAL, "provider" => provider.to_string())
                        .increment(1);
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(fitness) = &self.fitness {
            valid = rank(valid, fitness.as_ref());
        }
        Ok(valid)
    }
}

/// Stable sort by descending fitness; NaN scores compare equal.
fn rank(values: Vec<Value>, fitness: &(dyn Fn(&Value) -> f64 + Send + Sync)) -> Vec<Value> {
    let mut scored: Vec<(f64, Value)> = values.into_iter().map(|v| (fitness(&v), v)).collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(_, v)| v).collect()
}
