//! Process-local read cache in front of product reads.
//!
//! Entries expire a fixed time after insertion. Nothing here is
//! authoritative; callers fall back to the store on a miss and must delete
//! entries whose rows they change.
//!
//! # Backends
//!
//! - [`MokaReadCache`] - `moka` future cache, used by the server binary
//! - [`MemoryReadCache`] - `HashMap` with lazy expiry on the tokio clock,
//!   so tests can advance time deterministically

mod memory;
mod moka_impl;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Serialize;

use quickcart_core::{Product, ProductId};

pub use memory::MemoryReadCache;
pub use moka_impl::MokaReadCache;

/// Cache key for products.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    AllProducts,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product(id) => write!(f, "product:{id}"),
            Self::AllProducts => f.write_str("products:all"),
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
}

/// Counters reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub keys: u64,
    pub hits: u64,
    pub misses: u64,
    #[serde(rename = "hitRate")]
    pub hit_rate: f64,
}

impl CacheStats {
    fn new(keys: u64, hits: u64, misses: u64) -> Self {
        let lookups = hits + misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        };
        Self {
            keys,
            hits,
            misses,
            hit_rate,
        }
    }
}

/// Time-bounded key/value cache shared by every request.
#[async_trait]
pub trait ReadCache: Send + Sync {
    /// The live value for `key`, or `None` if absent or expired.
    async fn get(&self, key: &CacheKey) -> Option<CacheValue>;

    /// Store `value`, replacing any previous entry and restarting its TTL.
    async fn set(&self, key: CacheKey, value: CacheValue);

    /// Remove `key`. Deleting a missing key is a no-op.
    async fn delete(&self, key: &CacheKey);

    /// Current counters.
    async fn stats(&self) -> CacheStats;
}

/// Hit and miss counters shared by the backends.
#[derive(Debug, Default)]
struct HitCounter {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl HitCounter {
    fn record<T>(&self, key: &CacheKey, found: Option<T>) -> Option<T> {
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(%key, "cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(%key, "cache miss");
        }
        found
    }

    fn stats(&self, keys: u64) -> CacheStats {
        CacheStats::new(
            keys,
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}
