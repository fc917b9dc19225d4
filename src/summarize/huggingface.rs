//! Hosted summarization through the Hugging Face inference API

use super::{Summarizer, SummarizerError, SummaryParams};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn, Instrument};

/// Pauses before each retry; a cold model takes seconds to load
const RETRY_DELAYS_MS: [u64; 3] = [500, 1000, 2000];

/// Hugging Face summarizer configuration
#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub api_token: String,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            api_url: "https://api-inference.huggingface.co/models".to_string(),
            model: "sshleifer/distilbart-cnn-6-6".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Summarizer backed by a hosted BART-style model
pub struct HuggingFaceSummarizer {
    config: HuggingFaceConfig,
    client: Client,
}

impl HuggingFaceSummarizer {
    pub fn new(config: HuggingFaceConfig) -> Result<Self, SummarizerError> {
        if config.api_token.is_empty() {
            return Err(SummarizerError::NotConfigured(
                "Hugging Face API token is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SummarizerError::NetworkError(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Build request payload (pure function)
    fn build_request(text: &str, params: SummaryParams) -> SummarizationRequest {
        SummarizationRequest {
            inputs: text.to_string(),
            parameters: SummarizationParameters {
                max_length: params.max_length,
                min_length: params.min_length,
                do_sample: params.do_sample,
            },
            options: RequestOptions {
                wait_for_model: true,
            },
        }
    }

    /// Extract the first summary from the response (pure function)
    fn parse_response(outputs: Vec<SummarizationOutput>) -> Result<String, SummarizerError> {
        outputs
            .into_iter()
            .next()
            .map(|output| output.summary_text.trim().to_string())
            .filter(|summary| !summary.is_empty())
            .ok_or_else(|| SummarizerError::InvalidResponse("empty summary returned".to_string()))
    }

    /// Only a loading model or a network hiccup is worth another attempt
    fn is_retryable(error: &SummarizerError) -> bool {
        matches!(
            error,
            SummarizerError::ModelLoading(_) | SummarizerError::NetworkError(_)
        )
    }

    /// Retry orchestrator
    async fn summarize_with_retry(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizerError> {
        let mut last_error = None;

        for (attempt, &delay_ms) in std::iter::once(&0u64)
            .chain(RETRY_DELAYS_MS.iter())
            .enumerate()
        {
            if attempt > 0 {
                debug!("Summarizer retry attempt {} after {}ms", attempt, delay_ms);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            match self.make_api_request(&request).await {
                Ok(outputs) => return Self::parse_response(outputs),
                Err(e) => {
                    warn!("Summarizer attempt {} failed: {}", attempt + 1, e);
                    if !Self::is_retryable(&e) {
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }
        }

        error!("Summarizer failed after all retries");
        Err(last_error.unwrap_or_else(|| {
            SummarizerError::NetworkError("All retry attempts failed".to_string())
        }))
    }

    async fn make_api_request(
        &self,
        request: &SummarizationRequest,
    ) -> Result<Vec<SummarizationOutput>, SummarizerError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_token)
            .json(request)
            .send()
            .await
            .map_err(|e| SummarizerError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::ModelLoading(body));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::ApiError(format!("{status} - {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| SummarizerError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn summarize(
        &self,
        text: &str,
        params: SummaryParams,
    ) -> Result<String, SummarizerError> {
        let span = crate::generation_span!(
            stage = "summary",
            model = %self.config.model,
            input_chars = text.len()
        );

        self.summarize_with_retry(Self::build_request(text, params))
            .instrument(span)
            .await
    }
}

#[derive(Debug, Serialize)]
struct SummarizationRequest {
    inputs: String,
    parameters: SummarizationParameters,
    options: RequestOptions,
}

#[derive(Debug, Serialize)]
struct SummarizationParameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
}

#[derive(Debug, Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

#[derive(Debug, Deserialize)]
struct SummarizationOutput {
    summary_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_token() {
        let result = HuggingFaceSummarizer::new(HuggingFaceConfig::default());
        assert!(matches!(result, Err(SummarizerError::NotConfigured(_))));
    }

    #[test]
    fn test_endpoint_appends_model() {
        let summarizer = HuggingFaceSummarizer::new(HuggingFaceConfig {
            api_token: "hf_test".to_string(),
            api_url: "https://example.test/models/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            summarizer.endpoint(),
            "https://example.test/models/sshleifer/distilbart-cnn-6-6"
        );
    }

    #[test]
    fn test_request_payload_shape() {
        let request = HuggingFaceSummarizer::build_request("Some text", SummaryParams::default());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["inputs"], "Some text");
        assert_eq!(json["parameters"]["max_length"], 120);
        assert_eq!(json["parameters"]["min_length"], 50);
        assert_eq!(json["parameters"]["do_sample"], false);
        assert_eq!(json["options"]["wait_for_model"], true);
    }

    #[test]
    fn test_parse_response_takes_first_summary() {
        let outputs = vec![
            SummarizationOutput {
                summary_text: "  First.  ".to_string(),
            },
            SummarizationOutput {
                summary_text: "Second.".to_string(),
            },
        ];

        assert_eq!(
            HuggingFaceSummarizer::parse_response(outputs).unwrap(),
            "First."
        );
    }

    #[test]
    fn test_parse_response_rejects_empty() {
        assert!(HuggingFaceSummarizer::parse_response(vec![]).is_err());
    }

    #[test]
    fn test_retry_policy() {
        assert_eq!(RETRY_DELAYS_MS, [500, 1000, 2000]);

        assert!(HuggingFaceSummarizer::is_retryable(&SummarizerError::ModelLoading(
            "loading".to_string()
        )));
        assert!(HuggingFaceSummarizer::is_retryable(&SummarizerError::NetworkError(
            "reset".to_string()
        )));
        assert!(!HuggingFaceSummarizer::is_retryable(&SummarizerError::ApiError(
            "401".to_string()
        )));
        assert!(!HuggingFaceSummarizer::is_retryable(&SummarizerError::InvalidResponse(
            "bad json".to_string()
        )));
    }
}
