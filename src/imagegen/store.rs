//! Bounded in-memory store serving panel images by id

use super::GeneratedImage;
use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Least-recently-used store of rendered panels
///
/// The browser fetches panel art by id after the comic JSON arrives, so images
/// only need to outlive a page view. Old entries are dropped once full.
pub struct ImageStore {
    images: Mutex<LruCache<Uuid, GeneratedImage>>,
}

impl ImageStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            images: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn put(&self, image: GeneratedImage) -> Uuid {
        let id = Uuid::new_v4();
        self.images.lock().await.put(id, image);
        id
    }

    pub async fn get(&self, id: &Uuid) -> Option<GeneratedImage> {
        self.images.lock().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.images.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.images.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn image(tag: &'static str) -> GeneratedImage {
        GeneratedImage {
            bytes: Bytes::from_static(tag.as_bytes()),
            mime: "image/png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = ImageStore::new(4);
        let id = store.put(image("one")).await;

        assert_eq!(store.get(&id).await, Some(image("one")));
        assert_eq!(store.get(&Uuid::new_v4()).await, None);
    }

    #[tokio::test]
    async fn test_oldest_image_is_dropped() {
        let store = ImageStore::new(2);
        let first = store.put(image("one")).await;
        store.put(image("two")).await;
        store.put(image("three")).await;

        assert_eq!(store.len().await, 2);
        assert!(store.get(&first).await.is_none());
    }
}
