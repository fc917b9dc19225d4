//! Time-bounded result cache
//!
//! Generated stories and images are expensive, so identical requests within the
//! TTL window reuse the previous result. Entries are also bounded by count through
//! an LRU so a long-running server does not grow without limit.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// LRU cache whose entries expire after a fixed time-to-live
pub struct TtlCache<K, V> {
    entries: Mutex<LruCache<K, (Instant, V)>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Create a cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Return a live entry, dropping it if it has expired
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;

        let expired = match entries.get(key) {
            Some((stored_at, _)) => stored_at.elapsed() >= self.ttl,
            None => return None,
        };

        if expired {
            entries.pop(key);
            return None;
        }

        entries.get(key).map(|(_, value)| value.clone())
    }

    pub async fn insert(&self, key: K, value: V) {
        self.entries
            .lock()
            .await
            .put(key, (Instant::now(), value));
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
