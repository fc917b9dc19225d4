//! Integration tests for the OpenAI-compatible chat provider
//!
//! Tests behavioral contracts against a mock endpoint:
//! - Request shape (model, messages, sampling parameters, bearer auth)
//! - Error scenarios (auth failures, rate limits, server errors)
//! - Retry on transient failures only
//! - Finish reason and usage mapping

use edutoon::llm::provider::{CompletionRequest, FinishReason, LlmError, LlmProvider, Message};
use edutoon::llm::providers::openai::{OpenAiConfig, OpenAiProvider};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> OpenAiConfig {
    OpenAiConfig {
        api_key: "test-api-key".to_string(),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
    }
}

fn story_request() -> CompletionRequest {
    CompletionRequest {
        messages: vec![
            Message::system("You're a comic creator for kids, making engineering concepts fun."),
            Message::user("Create a 3-panel comic about 'Ohm's law'"),
        ],
        model: "mistralai/Mistral-7B-Instruct-v0.1".to_string(),
        max_tokens: Some(300),
        temperature: Some(0.7),
    }
}

fn completion_body(content: &str, finish_reason: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "model": "mistralai/Mistral-7B-Instruct-v0.1",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": finish_reason
            }
        ],
        "usage": {"prompt_tokens": 40, "completion_tokens": 60, "total_tokens": 100}
    })
}

#[tokio::test]
async fn test_openai_provider_sends_story_request_and_parses_completion() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-api-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "mistralai/Mistral-7B-Instruct-v0.1",
            "max_tokens": 300,
            "messages": [
                {"role": "system", "content": "You're a comic creator for kids, making engineering concepts fun."},
                {"role": "user", "content": "Create a 3-panel comic about 'Ohm's law'"}
            ]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("Panel 1: A squirrel...", "stop")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let response = provider.complete(story_request()).await.unwrap();

    assert_eq!(response.content.as_deref(), Some("Panel 1: A squirrel..."));
    assert_eq!(response.usage.total_tokens, 100);
    assert!(matches!(response.finish_reason, FinishReason::Stop));
}

#[tokio::test]
async fn test_openai_provider_accepts_response_without_usage() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "m",
            "choices": [{"message": {"role": "assistant", "content": "hi"}, "finish_reason": "length"}]
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let response = provider.complete(story_request()).await.unwrap();

    assert_eq!(response.usage.total_tokens, 0);
    assert!(matches!(response.finish_reason, FinishReason::Length));
}

#[tokio::test]
async fn test_openai_provider_does_not_retry_401() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            r#"{"error": {"message": "Incorrect API key provided"}}"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(story_request()).await;

    match result.unwrap_err() {
        LlmError::ApiError(msg) => {
            assert!(msg.contains("401"));
            assert!(msg.contains("Incorrect API key"));
        }
        other => panic!("Expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_provider_returns_error_when_api_responds_with_429() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string(
            r#"{"error": {"message": "Rate limit exceeded"}}"#,
        ))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(story_request()).await;

    match result.unwrap_err() {
        LlmError::ApiError(msg) => {
            assert!(msg.contains("429"));
            assert!(msg.contains("Rate limit exceeded"));
        }
        other => panic!("Expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_provider_retries_on_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service temporarily unavailable"))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body("Success after retry", "stop")),
        )
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let response = provider.complete(story_request()).await.unwrap();

    assert_eq!(response.content.as_deref(), Some("Success after retry"));
}

#[tokio::test]
async fn test_openai_provider_fails_after_all_retries_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service unavailable"))
        .expect(4)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(story_request()).await;

    assert!(matches!(result, Err(LlmError::ApiError(msg)) if msg.starts_with("server error")));
}

#[tokio::test]
async fn test_openai_provider_returns_error_when_choices_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "m",
            "choices": []
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(story_request()).await;

    assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
}
