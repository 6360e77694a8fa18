//! Application state shared across handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::ReadCache;
use crate::db::CommerceStore;
use crate::services::{CartSyncService, CatalogService, CheckoutService};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The store and cache are trait objects so
/// tests can run the same router over [`MemoryStore`](crate::db::MemoryStore)
/// and [`MemoryReadCache`](crate::cache::MemoryReadCache).
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn CommerceStore>,
    cache: Arc<dyn ReadCache>,
    started_at: Instant,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn CommerceStore>, cache: Arc<dyn ReadCache>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                cache,
                started_at: Instant::now(),
            }),
        }
    }

    /// Get a reference to the durable store.
    #[must_use]
    pub fn store(&self) -> &dyn CommerceStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the read cache.
    #[must_use]
    pub fn cache(&self) -> &dyn ReadCache {
        self.inner.cache.as_ref()
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self.store(), self.cache())
    }

    #[must_use]
    pub fn cart_sync(&self) -> CartSyncService<'_> {
        CartSyncService::new(self.store())
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutService<'_> {
        CheckoutService::new(self.store(), self.cache())
    }

    /// Time since the state was built.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }
}
