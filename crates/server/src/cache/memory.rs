//! In-process [`ReadCache`] with lazy expiry, driven by `tokio::time`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{CacheKey, CacheStats, CacheValue, HitCounter, ReadCache};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CacheValue,
    inserted_at: Instant,
}

/// [`ReadCache`] over a plain map, expiring entries lazily on read.
///
/// Time comes from `tokio::time`, so a paused runtime controls expiry.
#[derive(Debug, Clone)]
pub struct MemoryReadCache {
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
    ttl: Duration,
    counter: Arc<HitCounter>,
}

impl MemoryReadCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::default(),
            ttl,
            counter: Arc::default(),
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry));
        before - entries.len()
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        entry.inserted_at.elapsed() > self.ttl
    }
}

#[async_trait]
impl ReadCache for MemoryReadCache {
    async fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        let (found, expired) = {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if self.is_expired(entry) => (None, true),
                Some(entry) => (Some(entry.value.clone()), false),
                None => (None, false),
            }
        };

        if expired {
            let mut entries = self.entries.write().await;
            // A set may have refreshed the entry between the two locks.
            if entries.get(key).is_some_and(|entry| self.is_expired(entry)) {
                entries.remove(key);
            }
        }

        self.counter.record(key, found)
    }

    async fn set(&self, key: CacheKey, value: CacheValue) {
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
        };
        self.entries.write().await.insert(key, entry);
    }

    async fn delete(&self, key: &CacheKey) {
        self.entries.write().await.remove(key);
    }

    /// Also sweeps expired entries, so `keys` counts live ones.
    async fn stats(&self) -> CacheStats {
        let purged = self.purge_expired().await;
        if purged > 0 {
            tracing::debug!(purged, "expired cache entries swept");
        }
        let live = self.entries.read().await.len();
        self.counter.stats(live as u64)
    }
}

#[cfg(test)]
mod tests {
    use quickcart_core::ProductId;

    use super::*;

    fn empty_list() -> CacheValue {
        CacheValue::Products(Vec::new())
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_lives_for_ttl() {
        let cache = MemoryReadCache::new(Duration::from_secs(60));
        cache.set(CacheKey::AllProducts, empty_list()).await;

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(cache.get(&CacheKey::AllProducts).await.is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get(&CacheKey::AllProducts).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_restarts_ttl() {
        let cache = MemoryReadCache::new(Duration::from_secs(10));
        cache.set(CacheKey::AllProducts, empty_list()).await;
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set(CacheKey::AllProducts, empty_list()).await;
        tokio::time::advance(Duration::from_secs(8)).await;

        assert!(cache.get(&CacheKey::AllProducts).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = MemoryReadCache::new(Duration::from_secs(10));
        cache.set(CacheKey::AllProducts, empty_list()).await;
        tokio::time::advance(Duration::from_secs(11)).await;
        cache
            .set(CacheKey::Product(ProductId::new(1)), empty_list())
            .await;

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.stats().await.keys, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_removed_on_read() {
        let cache = MemoryReadCache::new(Duration::from_secs(10));
        let key = CacheKey::Product(ProductId::new(2));
        cache.set(key, empty_list()).await;
        cache.set(CacheKey::AllProducts, empty_list()).await;
        tokio::time::advance(Duration::from_secs(11)).await;

        assert!(cache.get(&key).await.is_none());

        let entries = cache.entries.read().await;
        assert!(!entries.contains_key(&key));
        assert!(entries.contains_key(&CacheKey::AllProducts));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let cache = MemoryReadCache::new(Duration::from_secs(10));
        let key = CacheKey::Product(ProductId::new(3));
        cache.set(key, empty_list()).await;
        cache.delete(&key).await;
        cache.delete(&key).await;

        assert!(cache.get(&key).await.is_none());
        let stats = cache.stats().await;
        assert_eq!((stats.hits, stats.misses, stats.keys), (0, 1, 0));
    }
}
