//! llm-function error types

use std::time::Duration;

/// llm-function error types
#[derive(Debug, thiserror::Error)]
pub enum LlmFunctionError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("empty response from model")]
    EmptyResponse,

    /// Local in-process inference failed.
    #[error("inference error: {0}")]
    Inference(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("please set up the {0} env variable")]
    MissingEnvVar(String),

    #[error("template error: {0}")]
    Template(String),

    // Validation errors
    /// A call argument failed its schema. `path` is the dotted key path.
    #[error("invalid argument '{path}': {message}")]
    InvalidArgument { path: String, message: String },

    /// A raw model response failed validation; the candidate is skipped.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("no JSON found in message")]
    NoJsonFound,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),
}

impl LlmFunctionError {
    /// Whether this error is a per-candidate validation failure.
    ///
    /// The function builder drops candidates that fail with one of these and
    /// propagates everything else.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LlmFunctionError::InvalidResponse(_)
                | LlmFunctionError::NoJsonFound
                | LlmFunctionError::InvalidJson(_)
        )
    }
}

impl From<minijinja::Error> for LlmFunctionError {
    fn from(err: minijinja::Error) -> Self {
        LlmFunctionError::Template(err.to_string())
    }
}

/// Result type alias for llm-function operations
pub type Result<T> = std::result::Result<T, LlmFunctionError>;
