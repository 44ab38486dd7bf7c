//! llmfn: llm-function CLI
//!
//! Run a prompt template against a remote provider, or inspect cache keys.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use llm_function::settings::Settings;
use llm_function::validate::{ArgSchema, ResponseSchema, validators};
use llm_function::{
    FunctionSchema, LlmFunction, MistralProvider, OpenAiProvider, Provider, ProviderConfig,
    default_key, make_path_safe, prompt_seed_key,
};
use serde_json::{Map, Value};

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// llm-function CLI
#[derive(Parser)]
#[command(name = "llmfn")]
#[command(version)]
#[command(about = "Run cached, retried LLM prompt templates")]
struct Args {
    /// Settings file (default: ~/.config/llm-function/config.toml)
    #[arg(short, long, env = "LLMFN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a template and print the validated responses as JSON lines
    Run {
        /// Template file
        template: PathBuf,
        /// Template arguments as a JSON object (or omit to read from stdin)
        args: Option<String>,
        /// Backend to call
        #[arg(short, long, value_enum, default_value_t = Backend::Openai)]
        provider: Backend,
        /// Model override
        #[arg(short, long)]
        model: Option<String>,
        /// Number of attempts
        #[arg(short, default_value_t = 1)]
        k: usize,
        /// JSON schema file the responses must satisfy
        #[arg(long)]
        json_schema: Option<PathBuf>,
        /// Maximum output tokens
        #[arg(long)]
        length: Option<u32>,
        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f64>,
        /// System prompt
        #[arg(long)]
        system_prompt: Option<String>,
    },

    /// Print the cache key derived from JSON keyword arguments
    Key {
        /// Keyword arguments as a JSON object (or omit to read from stdin)
        kwargs: Option<String>,
        /// Use the prompt-prefix/seed scheme (needs `prompt` and `seed`)
        #[arg(long)]
        prompt_seed: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Openai,
    Mistral,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Key {
            kwargs,
            prompt_seed,
        } => {
            let kwargs = parse_object(&get_input(kwargs)?)?;
            let key = if prompt_seed {
                prompt_seed_key(&kwargs)?
            } else {
                default_key(&[] as &[Value], &kwargs)?
            };
            println!("{}", make_path_safe(&key));
        }

        Command::Run {
            template,
            args: call_args,
            provider,
            model,
            k,
            json_schema,
            length,
            temperature,
            system_prompt,
        } => {
            let settings = Settings::load(args.config.as_deref())?.unwrap_or_default();
            let config = settings.config(|name| std::env::var(name).ok())?;
            tracing::debug!(data_path = %config.data_path().display(), "resolved configuration");

            let call_args = parse_object(&get_input(call_args)?)?;

            // Every given argument is passed through as-is.
            let arg_schema = ArgSchema::object(
                call_args
                    .keys()
                    .map(|key| (key.clone(), ArgSchema::leaf(validators::any()))),
            );
            let mut response = ResponseSchema::new();
            if let Some(path) = json_schema {
                let schema: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
                response = response.json_schema(schema)?;
            }

            let mut provider_config = ProviderConfig::new();
            provider_config.length = length;
            provider_config.temperature = temperature;
            provider_config.system_prompt = system_prompt;

            let provider: Box<dyn Provider> = match provider {
                Backend::Openai => {
                    let defaults = settings.openai();
                    let model = model
                        .or(defaults.model)
                        .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
                    match defaults.base_url {
                        Some(base_url) => Box::new(OpenAiProvider::with_base_url(
                            config.require_openai_api_key()?,
                            base_url,
                            model,
                            config.cache_store(llm_function::providers::openai::NAMESPACE),
                        )),
                        None => Box::new(OpenAiProvider::new(&config, model)?),
                    }
                }
                Backend::Mistral => {
                    let defaults = settings.mistral();
                    provider_config.model = model.or(defaults.model);
                    match defaults.base_url {
                        Some(base_url) => Box::new(MistralProvider::with_base_url(
                            config.require_mistral_api_key()?,
                            base_url,
                            config.cache_store(llm_function::providers::mistral::NAMESPACE),
                        )),
                        None => Box::new(MistralProvider::new(&config)?),
                    }
                }
            };

            let function = LlmFunction::build(
                template,
                FunctionSchema::new(arg_schema, response),
                None,
                Some(provider_config),
            )?;

            let responses = function
                .call(&Value::Object(call_args), provider.as_ref(), k)
                .await?;
            for response in responses {
                println!("{}", serde_json::to_string(&response)?);
            }
        }
    }

    Ok(())
}

/// Get input from argument or stdin.
fn get_input(arg: Option<String>) -> io::Result<String> {
    match arg {
        Some(text) => Ok(text),
        None => {
            if io::stdin().is_terminal() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "No input provided. Pass JSON as an argument or pipe it to stdin.",
                ));
            }
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer.trim().to_string())
        }
    }
}

fn parse_object(text: &str) -> Result<Map<String, Value>, Box<dyn std::error::Error>> {
    match serde_json::from_str(text)? {
        Value::Object(map) => Ok(map),
        _ => Err("expected a JSON object".into()),
    }
}
