//! OpenAI-compatible chat completion provider
//!
//! Works against any endpoint speaking the `/chat/completions` dialect. The
//! default base URL is DeepInfra's OpenAI-compatible gateway.

use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, TokenUsage,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, warn, Instrument};

/// Pauses before each retry; the first attempt is immediate
const RETRY_DELAYS_MS: [u64; 3] = [100, 200, 300];

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.deepinfra.com/v1/openai".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

/// A failed attempt and whether another attempt may succeed
struct AttemptError {
    error: LlmError,
    retryable: bool,
}

impl AttemptError {
    fn transient(error: LlmError) -> Self {
        Self {
            error,
            retryable: true,
        }
    }

    fn fatal(error: LlmError) -> Self {
        Self {
            error,
            retryable: false,
        }
    }

    fn from_status(status: StatusCode, body: String) -> Self {
        if status.is_server_error() {
            Self::transient(LlmError::ApiError(format!("server error: {status} - {body}")))
        } else {
            Self::fatal(LlmError::ApiError(format!("client error: {status} - {body}")))
        }
    }
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::NotConfigured(
                "chat completion API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn attempt(&self, request: &CompletionRequest) -> Result<ChatResponse, AttemptError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                AttemptError::transient(LlmError::NetworkError(format!(
                    "HTTP request failed: {} (is_connect: {}, is_timeout: {})",
                    e,
                    e.is_connect(),
                    e.is_timeout()
                )))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::from_status(status, body));
        }

        response
            .json()
            .await
            .map_err(|e| AttemptError::fatal(LlmError::InvalidResponse(e.to_string())))
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let span = crate::generation_span!(stage = "story", model = %request.model);

        async {
            let mut delays = RETRY_DELAYS_MS.iter();
            let mut attempt = 1;

            loop {
                let failure = match self.attempt(&request).await {
                    Ok(body) => {
                        let response = match body.into_completion() {
                            Ok(response) => response,
                            Err(e) => return Err(e),
                        };
                        debug!(
                            "Chat completion finished after {} attempt(s): {} tokens, {:?}",
                            attempt, response.usage.total_tokens, response.finish_reason
                        );
                        return Ok(response);
                    }
                    Err(failure) => failure,
                };

                warn!("Chat completion attempt {} failed: {}", attempt, failure.error);
                match delays.next() {
                    Some(&delay_ms) if failure.retryable => {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        attempt += 1;
                    }
                    _ => {
                        error!("Giving up on chat completion: {}", failure.error);
                        return Err(failure.error);
                    }
                }
            }
        }
        .instrument(span)
        .await
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_completion(self) -> Result<CompletionResponse, LlmError> {
        let choice = self.choices.into_iter().next().ok_or_else(|| {
            LlmError::InvalidResponse("No choices returned from provider".to_string())
        })?;

        Ok(CompletionResponse {
            content: choice.message.content,
            model: self.model,
            usage: self.usage.unwrap_or_default(),
            finish_reason: FinishReason::from_wire(choice.finish_reason.as_deref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_requires_api_key() {
        let result = OpenAiProvider::new(OpenAiConfig::default());
        assert!(matches!(result, Err(LlmError::NotConfigured(_))));
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash() {
        let provider = OpenAiProvider::new(OpenAiConfig {
            api_key: "k".to_string(),
            base_url: "https://api.deepinfra.com/v1/openai/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            provider.endpoint(),
            "https://api.deepinfra.com/v1/openai/chat/completions"
        );
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_only_server_errors_are_retryable() {
        assert!(AttemptError::from_status(StatusCode::BAD_GATEWAY, String::new()).retryable);
        assert!(!AttemptError::from_status(StatusCode::UNAUTHORIZED, String::new()).retryable);
        assert!(!AttemptError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()).retryable);
    }

    #[test]
    fn test_response_maps_first_choice() {
        let body: ChatResponse = serde_json::from_value(serde_json::json!({
            "model": "m",
            "choices": [{"message": {"role": "assistant", "content": "Panel 1: hi"}, "finish_reason": "eos"}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 4, "total_tokens": 7}
        }))
        .unwrap();

        let response = body.into_completion().unwrap();
        assert_eq!(response.content.as_deref(), Some("Panel 1: hi"));
        assert_eq!(response.usage.total_tokens, 7);
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn test_response_without_choices_is_invalid() {
        let body = ChatResponse {
            model: "m".to_string(),
            choices: vec![],
            usage: None,
        };
        assert!(matches!(
            body.into_completion(),
            Err(LlmError::InvalidResponse(_))
        ));
    }
}
