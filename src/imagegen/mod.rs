//! Panel art generation
//!
//! Panels are drawn by a remote text-to-image service. When that is not
//! available the panel text is rendered onto a plain card instead.

pub mod cached;
pub mod fallback;
pub mod stability;
pub mod store;

pub use cached::CachedImageGenerator;
pub use fallback::render_fallback_panel;
pub use stability::{StabilityConfig, StabilityImageGenerator};
pub use store::ImageStore;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

/// Encoded image bytes and their MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Bytes,
    pub mime: String,
}

impl GeneratedImage {
    /// Wrap raw bytes, sniffing the MIME type from their magic number
    pub fn sniffed(bytes: Bytes) -> Option<Self> {
        let format = image::guess_format(&bytes).ok()?;
        Some(Self {
            mime: format.to_mime_type().to_string(),
            bytes,
        })
    }
}

/// Image generation errors
#[derive(Debug, Clone, Error)]
pub enum ImageError {
    #[error("Image generation not configured: {0}")]
    NotConfigured(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Non-success status; `body` is the service's JSON error payload
    #[error("Error generating image: {status} {body}")]
    Api { status: u16, body: Value },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Text-to-image generator trait for dependency injection and testing
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageError>;
}

/// Placeholder used when no image service key is available
pub struct UnconfiguredImageGenerator {
    reason: String,
}

impl UnconfiguredImageGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ImageGenerator for UnconfiguredImageGenerator {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn generate(&self, _prompt: &str) -> Result<GeneratedImage, ImageError> {
        Err(ImageError::NotConfigured(self.reason.clone()))
    }
}
