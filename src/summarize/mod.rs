//! Summarization model invocation
//!
//! Wikipedia intros are condensed into a short explanation by a hosted
//! sequence-to-sequence model. Without an API token the pipeline degrades to an
//! extractive passthrough so the rest of the page still works.

pub mod huggingface;
pub mod passthrough;

pub use huggingface::{HuggingFaceConfig, HuggingFaceSummarizer};
pub use passthrough::PassthroughSummarizer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length and sampling controls for one summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryParams {
    /// Upper bound in model tokens
    pub max_length: u32,
    /// Lower bound in model tokens
    pub min_length: u32,
    pub do_sample: bool,
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            max_length: 120,
            min_length: 50,
            do_sample: false,
        }
    }
}

/// Summarizer errors
#[derive(Debug, Clone, Error)]
pub enum SummarizerError {
    #[error("Summarizer not configured: {0}")]
    NotConfigured(String),
    #[error("Model is loading: {0}")]
    ModelLoading(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Text summarizer trait for dependency injection and testing
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    async fn summarize(&self, text: &str, params: SummaryParams)
        -> Result<String, SummarizerError>;
}
