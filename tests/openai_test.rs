//! Wiremock integration tests for the OpenAI adapter.

use std::time::Duration;

use llm_function::providers::openai::NAMESPACE;
use llm_function::{
    CacheStore, Config, LlmFunctionError, OpenAiProvider, Provider, ProviderConfig, RetryConfig,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

fn provider(server: &MockServer, root: &TempDir) -> OpenAiProvider {
    OpenAiProvider::with_base_url(
        "test-key",
        server.uri(),
        "gpt-test",
        CacheStore::new(root.path(), NAMESPACE),
    )
    .retry(
        RetryConfig::new()
            .max_retries(1)
            .initial_delay(Duration::from_millis(1)),
    )
}

#[tokio::test]
async fn results_follow_seed_order_not_completion_order() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    for (seed, content, delay_ms) in [(0, "zero", 300), (1, "one", 0), (2, "two", 150)] {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({"seed": seed})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion(content))
                    .set_delay(Duration::from_millis(delay_ms)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let responses = provider(&server, &root)
        .generate_responses("Hello", 3, &ProviderConfig::new())
        .await
        .unwrap();

    assert_eq!(responses, vec!["zero", "one", "two"]);
}

#[tokio::test]
async fn second_batch_is_served_from_cache() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Hi there")))
        .expect(2)
        .mount(&server)
        .await;

    let provider = provider(&server, &root);
    let config = ProviderConfig::new().length(32);
    let first = provider.generate_responses("Hello", 2, &config).await.unwrap();
    let second = provider.generate_responses("Hello", 2, &config).await.unwrap();

    assert_eq!(first, vec!["Hi there", "Hi there"]);
    assert_eq!(first, second);

    let entries: Vec<_> = std::fs::read_dir(root.path().join(NAMESPACE))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 2);
    for entry in entries {
        let content = std::fs::read_to_string(entry).unwrap();
        assert!(content.contains("\"Hi there\""));
    }
}

#[tokio::test]
async fn changed_options_miss_the_cache() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
        .expect(2)
        .mount(&server)
        .await;

    let provider = provider(&server, &root);
    provider
        .generate_responses("Hello", 1, &ProviderConfig::new().temperature(0.1))
        .await
        .unwrap();
    provider
        .generate_responses("Hello", 1, &ProviderConfig::new().temperature(0.9))
        .await
        .unwrap();
}

#[tokio::test]
async fn request_carries_model_length_and_json_format() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "model": "gpt-override",
            "max_tokens": 100,
            "seed": 0,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": "Answer in JSON."},
                {"role": "user", "content": "Hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"a\": 1}")))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig::new()
        .model("gpt-override")
        .length(100)
        .system_prompt("Answer in JSON.")
        .json_schema(json!({"type": "object"}));
    let responses = provider(&server, &root)
        .generate_responses("Hello", 1, &config)
        .await
        .unwrap();

    assert_eq!(responses, vec!["{\"a\": 1}"]);
}

#[tokio::test]
async fn one_exhausted_attempt_fails_the_batch() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"seed": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("fine")))
        .mount(&server)
        .await;
    // one try plus one retry
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"seed": 1})))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(2)
        .mount(&server)
        .await;

    let err = provider(&server, &root)
        .generate_responses("Hello", 2, &ProviderConfig::new())
        .await
        .unwrap_err();

    match err {
        LlmFunctionError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn transient_failure_is_retried_then_cached() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("recovered")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider(&server, &root);
    let first = provider
        .generate_responses("Hello", 1, &ProviderConfig::new())
        .await
        .unwrap();
    let second = provider
        .generate_responses("Hello", 1, &ProviderConfig::new())
        .await
        .unwrap();

    assert_eq!(first, vec!["recovered"]);
    assert_eq!(second, first);
}

#[tokio::test]
async fn empty_choices_is_an_error() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = provider(&server, &root)
        .generate_responses("Hello", 1, &ProviderConfig::new())
        .await
        .unwrap_err();
    assert!(matches!(err, LlmFunctionError::EmptyResponse));
    assert!(!root.path().join(NAMESPACE).exists());
}

#[tokio::test]
async fn zero_attempts_is_an_empty_batch() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let responses = provider(&server, &root)
        .generate_responses("Hello", 0, &ProviderConfig::new())
        .await
        .unwrap();
    assert!(responses.is_empty());
}

#[test]
fn missing_api_key_names_the_variable() {
    let root = TempDir::new().unwrap();
    let err = OpenAiProvider::new(&Config::new(root.path()), "gpt-test")
        .err()
        .unwrap();
    assert_eq!(err.to_string(), "please set up the OPENAI_API_KEY env variable");
}

#[test]
fn sync_batch_runs_without_a_runtime() {
    let root = TempDir::new().unwrap();
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("sync")))
            .mount(&server)
            .await;
        server
    });

    let responses = provider(&server, &root)
        .sync_generate_responses("Hello", 2, &ProviderConfig::new())
        .unwrap();
    assert_eq!(responses, vec!["sync", "sync"]);
}
