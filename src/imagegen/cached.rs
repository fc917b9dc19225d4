//! Prompt-keyed caching around any [`ImageGenerator`]

use super::{GeneratedImage, ImageError, ImageGenerator};
use crate::cache::TtlCache;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Reuses successful generations for identical prompts within the TTL
pub struct CachedImageGenerator {
    inner: Arc<dyn ImageGenerator>,
    cache: TtlCache<String, GeneratedImage>,
}

impl CachedImageGenerator {
    pub fn new(inner: Arc<dyn ImageGenerator>, capacity: usize, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(capacity, ttl),
        }
    }
}

#[async_trait]
impl ImageGenerator for CachedImageGenerator {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageError> {
        let key = prompt.to_string();
        if let Some(image) = self.cache.get(&key).await {
            debug!("Image cache hit");
            return Ok(image);
        }

        let image = self.inner.generate(prompt).await?;
        self.cache.insert(key, image.clone()).await;
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::MockImageGenerator;

    #[tokio::test]
    async fn test_same_prompt_hits_inner_once() {
        let inner = Arc::new(MockImageGenerator::new());
        let cached = CachedImageGenerator::new(inner.clone(), 4, Duration::from_secs(60));

        cached.generate("a robot").await.unwrap();
        cached.generate("a robot").await.unwrap();
        cached.generate("a squirrel").await.unwrap();

        assert_eq!(
            inner.prompts().await,
            vec!["a robot".to_string(), "a squirrel".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let inner = Arc::new(MockImageGenerator::with_failure());
        let cached = CachedImageGenerator::new(inner.clone(), 4, Duration::from_secs(60));

        assert!(cached.generate("a robot").await.is_err());
        assert!(cached.generate("a robot").await.is_err());
        assert_eq!(inner.prompts().await.len(), 2);
    }
}
