//! Product reads, cache first.

use tracing::instrument;

use quickcart_core::{Product, ProductId};

use crate::cache::{CacheKey, CacheValue, ReadCache};
use crate::db::{CommerceStore, RepositoryError};

/// Catalog reads.
pub struct CatalogService<'a> {
    store: &'a dyn CommerceStore,
    cache: &'a dyn ReadCache,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn CommerceStore, cache: &'a dyn ReadCache) -> Self {
        Self { store, cache }
    }

    /// Every product, served from the cache while fresh.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the cache misses and the store read fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        if let Some(CacheValue::Products(products)) = self.cache.get(&CacheKey::AllProducts).await
        {
            return Ok(products);
        }

        let products = self.store.list_products().await?;
        self.cache
            .set(CacheKey::AllProducts, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// One product, served from the cache while fresh.
    ///
    /// Unknown ids are not cached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the cache misses and the store read fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            return Ok(Some(*product));
        }

        let product = self.store.find_product(id).await?;
        if let Some(product) = &product {
            self.cache
                .set(key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }
        Ok(product)
    }
}
