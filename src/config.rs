//! Configuration system for EduToon
//!
//! All sections are optional in the TOML file; every field carries a default so an
//! empty file (or no file at all) yields a working configuration. API keys are never
//! stored in the file: each upstream names the environment variable that holds it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub wikipedia: WikipediaSection,
    pub summarizer: SummarizerSection,
    pub llm: LlmSection,
    pub images: ImagesSection,
    pub cache: CacheSection,
}

/// HTTP server section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSection {
    /// Interface to bind, e.g. "127.0.0.1" or "0.0.0.0"
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

/// Wikipedia section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WikipediaSection {
    /// MediaWiki action API endpoint
    pub api_url: String,
    pub user_agent: String,
    /// Number of sentences requested for the intro summary
    pub summary_sentences: u32,
    pub auto_suggest: bool,
    pub timeout_secs: u64,
}

impl Default for WikipediaSection {
    fn default() -> Self {
        Self {
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            user_agent: format!("edutoon/{} (educational comics)", env!("CARGO_PKG_VERSION")),
            summary_sentences: 5,
            auto_suggest: true,
            timeout_secs: 20,
        }
    }
}

/// Summarization model section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SummarizerSection {
    /// Inference endpoint; the model id is appended as a path segment
    pub api_url: String,
    pub model: String,
    pub api_key_env: String,
    pub max_length: u32,
    pub min_length: u32,
    pub do_sample: bool,
    pub timeout_secs: u64,
}

impl Default for SummarizerSection {
    fn default() -> Self {
        Self {
            api_url: "https://api-inference.huggingface.co/models".to_string(),
            model: "sshleifer/distilbart-cnn-6-6".to_string(),
            api_key_env: "HF_API_TOKEN".to_string(),
            max_length: 120,
            min_length: 50,
            do_sample: false,
            timeout_secs: 60,
        }
    }
}

/// Chat-completion section (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSection {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub system_prompt: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepinfra.com/v1/openai".to_string(),
            model: "mistralai/Mistral-7B-Instruct-v0.1".to_string(),
            api_key_env: "DEEPINFRA_API_KEY".to_string(),
            system_prompt: "You're a comic creator for kids, making engineering concepts fun."
                .to_string(),
            temperature: Some(0.7),
            max_tokens: Some(300),
            timeout_secs: 60,
        }
    }
}

/// Image generation section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImagesSection {
    pub base_url: String,
    pub endpoint: String,
    pub api_key_env: String,
    /// Output format requested from the generator (webp, png, jpeg)
    pub output_format: String,
    /// Pause between consecutive panel requests
    pub request_spacing_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.stability.ai".to_string(),
            endpoint: "/v2beta/stable-image/generate/ultra".to_string(),
            api_key_env: "STABILITY_API_KEY".to_string(),
            output_format: "webp".to_string(),
            request_spacing_ms: 1000,
            timeout_secs: 120,
        }
    }
}

/// Result cache section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheSection {
    pub ttl_secs: u64,
    /// Maximum cached stories and images
    pub capacity: usize,
    /// Maximum generated images kept for serving to the browser
    pub image_store_capacity: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            capacity: 128,
            image_store_capacity: 256,
        }
    }
}

impl CacheSection {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid URL for {field}: {value}")]
    InvalidUrl { field: String, value: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Files tried, in order, when no config path is given
pub const CONFIG_SEARCH_PATHS: [&str; 2] = ["edutoon.toml", "config/edutoon.toml"];

impl AppConfig {
    /// Load `explicit` if given, else the first of [`CONFIG_SEARCH_PATHS`]
    /// under `base_dir`, else the built-in defaults
    ///
    /// Returns the file that was loaded, if any.
    pub fn discover(
        explicit: Option<&Path>,
        base_dir: &Path,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load_from_file(path)?, Some(path.to_path_buf())));
        }

        for candidate in CONFIG_SEARCH_PATHS {
            let path = base_dir.join(candidate);
            if path.is_file() {
                return Ok((Self::load_from_file(&path)?, Some(path)));
            }
        }

        let config = Self::default();
        config.validate()?;
        Ok((config, None))
    }

    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("wikipedia.api_url", &self.wikipedia.api_url)?;
        validate_url("summarizer.api_url", &self.summarizer.api_url)?;
        validate_url("llm.base_url", &self.llm.base_url)?;
        validate_url("images.base_url", &self.images.base_url)?;

        if self.server.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "server.port must be non-zero".to_string(),
            ));
        }

        if !(1..=10).contains(&self.wikipedia.summary_sentences) {
            return Err(ConfigError::InvalidConfig(format!(
                "wikipedia.summary_sentences must be between 1 and 10, got {}",
                self.wikipedia.summary_sentences
            )));
        }

        if self.summarizer.min_length > self.summarizer.max_length {
            return Err(ConfigError::InvalidConfig(format!(
                "summarizer.min_length ({}) exceeds max_length ({})",
                self.summarizer.min_length, self.summarizer.max_length
            )));
        }

        if self.cache.capacity == 0 || self.cache.image_store_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "cache capacities must be non-zero".to_string(),
            ));
        }

        if !matches!(
            self.images.output_format.as_str(),
            "webp" | "png" | "jpeg"
        ) {
            return Err(ConfigError::InvalidConfig(format!(
                "images.output_format must be webp, png or jpeg, got '{}'",
                self.images.output_format
            )));
        }

        Ok(())
    }

    /// Helper method to get environment variable with consistent error handling
    fn get_env_var_optional(env_var_name: &str) -> Option<String> {
        std::env::var(env_var_name)
            .ok()
            .filter(|value| !value.trim().is_empty())
    }

    /// Helper method to get environment variable with error propagation
    fn get_env_var_required(env_var_name: &str) -> Result<String, ConfigError> {
        Self::get_env_var_optional(env_var_name)
            .ok_or_else(|| ConfigError::EnvVarNotFound(env_var_name.to_string()))
    }

    /// Summarizer API token, if configured
    pub fn get_summarizer_api_key(&self) -> Option<String> {
        Self::get_env_var_optional(&self.summarizer.api_key_env)
    }

    /// Chat-completion API key
    pub fn get_llm_api_key(&self) -> Result<String, ConfigError> {
        Self::get_env_var_required(&self.llm.api_key_env)
    }

    /// Image generation API key
    pub fn get_images_api_key(&self) -> Result<String, ConfigError> {
        Self::get_env_var_required(&self.images.api_key_env)
    }
}

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::InvalidUrl {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}
