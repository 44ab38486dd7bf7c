//! HTTP client for OpenAI-compatible `/chat/completions` endpoints.
//!
//! Shared by the OpenAI and Mistral adapters; both speak the same request and
//! response shape and differ only in field names and defaults.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::telemetry;
use crate::{LlmFunctionError, Result};

/// Authenticated client for one chat-completions API.
///
/// Owned by an adapter and shared read-only across its concurrent attempts.
#[derive(Clone)]
pub(crate) struct ChatCompletionsClient {
    provider: &'static str,
    api_key: String,
    http: Client,
    base_url: String,
}

impl ChatCompletionsClient {
    pub(crate) fn new(
        provider: &'static str,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(600))
            .build()
            .expect("failed to build HTTP client");

        Self {
            provider,
            api_key: api_key.into(),
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST one completion request and return the first choice's content.
    pub(crate) async fn complete(&self, body: &Map<String, Value>) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let result = self.send(&url, body).await;
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "provider" => self.provider,
            "status" => status,
        )
        .increment(1);
        result
    }

    async fn send(&self, url: &str, body: &Map<String, Value>) -> Result<String> {
        let response = self
            .http
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| LlmFunctionError::Http(e.to_string()))?;

        let response = handle_response_errors(response).await?;

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmFunctionError::Http(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmFunctionError::EmptyResponse)
    }
}

/// Check response status and map to the appropriate error.
async fn handle_response_errors(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        401 => Err(LlmFunctionError::AuthenticationFailed),
        429 => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            Err(LlmFunctionError::RateLimited { retry_after })
        }
        code => {
            let body = response.text().await.unwrap_or_default();
            let message = if body.is_empty() {
                status.to_string()
            } else {
                body
            };
            Err(LlmFunctionError::Api {
                status: code,
                message,
            })
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Copy `extra` options into `body` without overwriting fields the adapter set.
pub(crate) fn merge_passthrough(body: &mut Map<String, Value>, extra: &Map<String, Value>) {
    for (key, value) in extra {
        body.entry(key.clone()).or_insert_with(|| value.clone());
    }
}
