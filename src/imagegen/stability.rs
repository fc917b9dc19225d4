//! Stability AI text-to-image client

use super::{GeneratedImage, ImageError, ImageGenerator};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn, Instrument};

/// Stability client configuration
#[derive(Debug, Clone)]
pub struct StabilityConfig {
    pub api_key: String,
    pub base_url: String,
    pub endpoint: String,
    pub output_format: String,
    pub timeout: Duration,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.stability.ai".to_string(),
            endpoint: "/v2beta/stable-image/generate/ultra".to_string(),
            output_format: "webp".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Generates panel art with Stable Image Ultra
pub struct StabilityImageGenerator {
    config: StabilityConfig,
    client: Client,
}

impl StabilityImageGenerator {
    pub fn new(config: StabilityConfig) -> Result<Self, ImageError> {
        if config.api_key.is_empty() {
            return Err(ImageError::NotConfigured(
                "Stability API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ImageError::NetworkError(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.endpoint.trim_start_matches('/')
        )
    }

    /// Decode an error body as JSON, keeping raw text when it is not JSON
    fn error_body(text: String) -> Value {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    }

    /// Single multipart request; the service is not retried
    async fn request_image(&self, prompt: &str) -> Result<GeneratedImage, ImageError> {
        let form = Form::new()
            .text("prompt", prompt.to_string())
            .text("output_format", self.config.output_format.clone());

        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.config.api_key)
            .header(ACCEPT, "image/*")
            .multipart(form)
            .send()
            .await
            .map_err(|e| ImageError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Image generation returned {}", status);
            return Err(ImageError::Api {
                status: status.as_u16(),
                body: Self::error_body(text),
            });
        }

        let declared = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageError::NetworkError(e.to_string()))?;

        if let Some(image) = GeneratedImage::sniffed(bytes.clone()) {
            debug!("Generated {} image, {} bytes", image.mime, image.bytes.len());
            return Ok(image);
        }

        match declared {
            Some(mime) if mime.starts_with("image/") => Ok(GeneratedImage { bytes, mime }),
            other => Err(ImageError::InvalidResponse(format!(
                "response is not a recognized image (content-type: {})",
                other.unwrap_or_else(|| "none".to_string())
            ))),
        }
    }
}

#[async_trait]
impl ImageGenerator for StabilityImageGenerator {
    fn name(&self) -> &str {
        "stability"
    }

    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageError> {
        let span = crate::generation_span!(
            stage = "image",
            provider = "stability",
            prompt_chars = prompt.len()
        );

        self.request_image(prompt).instrument(span).await
    }
}
