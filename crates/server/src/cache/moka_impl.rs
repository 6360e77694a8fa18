//! Production [`ReadCache`] backed by `moka`.

use async_trait::async_trait;
use moka::future::Cache;

use super::{CacheKey, CacheStats, CacheValue, HitCounter, ReadCache};
use crate::config::CacheConfig;

/// [`ReadCache`] over a bounded `moka` cache with a fixed TTL.
#[derive(Clone)]
pub struct MokaReadCache {
    cache: Cache<CacheKey, CacheValue>,
    counter: std::sync::Arc<HitCounter>,
}

impl MokaReadCache {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();
        Self {
            cache,
            counter: std::sync::Arc::default(),
        }
    }
}

#[async_trait]
impl ReadCache for MokaReadCache {
    async fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        let found = self.cache.get(key).await;
        self.counter.record(key, found)
    }

    async fn set(&self, key: CacheKey, value: CacheValue) {
        self.cache.insert(key, value).await;
    }

    async fn delete(&self, key: &CacheKey) {
        self.cache.invalidate(key).await;
    }

    async fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks().await;
        self.counter.stats(self.cache.entry_count())
    }
}
