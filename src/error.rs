//! Error types for EduToon
//!
//! Every upstream seam (Wikipedia, summarizer, chat completion, image generation)
//! owns its own error enum. `EduToonError` unifies them and maps each onto an HTTP
//! status and a browser-safe `ErrorBody`.

use crate::imagegen::ImageError;
use crate::llm::provider::LlmError;
use crate::summarize::SummarizerError;
use crate::wiki::WikiError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for EduToon operations
#[derive(Debug, Error)]
pub enum EduToonError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Wikipedia error: {0}")]
    Wiki(#[from] WikiError),

    #[error("Summarizer error: {0}")]
    Summarizer(#[from] SummarizerError),

    #[error("LLM provider error: {0}")]
    Llm(#[from] LlmError),

    #[error("Image generation error: {0}")]
    Image(#[from] ImageError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Stable error codes exposed to the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
    Disambiguation,
    UpstreamError,
    ConfigurationError,
    InternalError,
}

/// JSON error payload returned by the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    /// Candidate titles when a concept is ambiguous
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl EduToonError {
    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create not found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create internal error
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Protocol-level code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            EduToonError::InvalidInput { .. } => ErrorCode::InvalidInput,
            EduToonError::NotFound { .. } => ErrorCode::NotFound,
            EduToonError::Wiki(WikiError::Disambiguation { .. }) => ErrorCode::Disambiguation,
            EduToonError::Wiki(WikiError::PageNotFound(_)) => ErrorCode::NotFound,
            EduToonError::Wiki(_)
            | EduToonError::Summarizer(_)
            | EduToonError::Llm(_)
            | EduToonError::Image(_) => ErrorCode::UpstreamError,
            EduToonError::Config(_) => ErrorCode::ConfigurationError,
            EduToonError::InternalError { .. } => ErrorCode::InternalError,
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self.code() {
            ErrorCode::InvalidInput => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::Disambiguation => 409,
            ErrorCode::UpstreamError => 502,
            ErrorCode::ConfigurationError | ErrorCode::InternalError => 500,
        }
    }

    /// Convert into a sanitized body suitable for the browser
    pub fn to_error_body(&self) -> ErrorBody {
        let (message, options) = match self {
            EduToonError::InvalidInput { message }
            | EduToonError::NotFound { message }
            | EduToonError::InternalError { message } => (message.clone(), Vec::new()),
            EduToonError::Wiki(WikiError::Disambiguation { options, .. }) => (
                format!(
                    "Too many meanings. Try being more specific. Options: {}",
                    options.join(", ")
                ),
                options.clone(),
            ),
            EduToonError::Wiki(WikiError::PageNotFound(message)) => (message.clone(), Vec::new()),
            other => (other.to_string(), Vec::new()),
        };

        ErrorBody {
            code: self.code(),
            message: sanitize_error_message(&message),
            options,
        }
    }
}

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+").expect("valid regex")
});

static BEARER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bbearer\s+\S+").expect("valid regex"));

static SENSITIVE_PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
        .expect("valid regex")
});

const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Sanitize error messages so API keys and local paths never reach the browser
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = SECRET_PATTERN
        .replace_all(message, "${1}=***")
        .to_string();

    sanitized = BEARER_PATTERN
        .replace_all(&sanitized, "Bearer ***")
        .to_string();

    sanitized = SENSITIVE_PATH_PATTERN
        .replace_all(&sanitized, "/***REDACTED***/")
        .to_string();

    if sanitized.len() > MAX_ERROR_MESSAGE_LEN {
        let truncate_suffix = "...[truncated]";
        let mut cut = MAX_ERROR_MESSAGE_LEN - truncate_suffix.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized = format!("{}{}", &sanitized[..cut], truncate_suffix);
    }

    sanitized
}

/// Result type for EduToon operations
pub type EduToonResult<T> = Result<T, EduToonError>;
