//! Checkout: turn a cart into an order.
//!
//! Everything runs inside one [`CheckoutTransaction`]:
//!
//! 1. Resolve each product, cache first, falling back to the transaction
//! 2. Check stock for every item before touching anything
//! 3. Decrement stock per item and drop that product's cache entry
//! 4. Insert the order
//! 5. Clear the user's cart
//! 6. Drop the product list cache entry
//! 7. Commit, then drop every touched cache entry again
//!
//! Any failure rolls the transaction back. Cache deletes are not undone.

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{Span, instrument};

use quickcart_core::api::CartSnapshot;
use quickcart_core::{
    CartItem, ItemError, NewOrder, Order, OrderItem, Product, ProductId, UserId, coalesce_items,
    line_total, total_quantity, validate_items,
};

use crate::cache::{CacheKey, CacheValue, ReadCache};
use crate::db::{CheckoutTransaction, CommerceStore, RepositoryError};

/// Errors that can occur during checkout.
///
/// The display strings are returned to clients as-is.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("{0}")]
    InvalidItems(#[from] ItemError),

    #[error("Product {0} not found")]
    NotFound(ProductId),

    #[error("Insufficient stock for {name}. Available: {available}, Requested: {requested}")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        available: i32,
        requested: u32,
    },

    #[error("{0}")]
    Store(#[from] RepositoryError),
}

/// Where a checkout is in its lifecycle.
///
/// `Committed` and `RolledBack` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutPhase {
    Validating,
    Mutating,
    Committed,
    RolledBack,
}

impl CheckoutPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Mutating => "mutating",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        }
    }
}

impl fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn enter(phase: CheckoutPhase) {
    Span::current().record("phase", phase.as_str());
    tracing::debug!(%phase, "checkout phase");
}

/// Checkout operations.
pub struct CheckoutService<'a> {
    store: &'a dyn CommerceStore,
    cache: &'a dyn ReadCache,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn CommerceStore, cache: &'a dyn ReadCache) -> Self {
        Self { store, cache }
    }

    /// Place an order for `snapshot`.
    ///
    /// Repeated product ids are merged before stock is checked.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` or `CheckoutError::InvalidItems`
    /// before any store access. Returns `CheckoutError::NotFound`,
    /// `CheckoutError::InsufficientStock` or `CheckoutError::Store` after
    /// rolling back.
    #[instrument(
        skip(self, snapshot),
        fields(
            user_id = %snapshot.user_id,
            items = snapshot.items.len(),
            phase = tracing::field::Empty
        )
    )]
    pub async fn checkout(&self, snapshot: &CartSnapshot) -> Result<Order, CheckoutError> {
        let items = coalesce_items(&snapshot.items);
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        validate_items(&snapshot.items)?;
        validate_items(&items)?;

        let mut tx = self.store.begin_checkout().await?;
        let mut touched = Vec::with_capacity(items.len() + 1);

        let result = self
            .run(tx.as_mut(), &snapshot.user_id, &items, &mut touched)
            .await;

        match result {
            Ok(order) => {
                if let Err(e) = tx.commit().await {
                    enter(CheckoutPhase::RolledBack);
                    return Err(e.into());
                }
                enter(CheckoutPhase::Committed);
                for key in &touched {
                    self.cache.delete(key).await;
                }
                tracing::info!(
                    order_id = %order.id,
                    total = %order.total_amount,
                    units = total_quantity(&items),
                    "order placed"
                );
                Ok(order)
            }
            Err(e) => {
                enter(CheckoutPhase::RolledBack);
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "checkout rollback failed");
                }
                tracing::info!(error = %e, "checkout rejected");
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        tx: &mut dyn CheckoutTransaction,
        user_id: &UserId,
        items: &[CartItem],
        touched: &mut Vec<CacheKey>,
    ) -> Result<Order, CheckoutError> {
        enter(CheckoutPhase::Validating);

        let mut resolved: Vec<(Product, u32)> = Vec::with_capacity(items.len());
        for item in items {
            let product = self
                .resolve_product(tx, item.product_id)
                .await?
                .ok_or(CheckoutError::NotFound(item.product_id))?;
            resolved.push((product, item.quantity));
        }

        for (product, quantity) in &resolved {
            if !product.has_stock_for(*quantity) {
                return Err(insufficient(product, product.stock, *quantity));
            }
        }

        enter(CheckoutPhase::Mutating);

        for (product, quantity) in &resolved {
            if !tx.decrement_stock(product.id, *quantity).await? {
                // The resolved copy was stale; report what the store holds.
                let available = tx
                    .find_product(product.id)
                    .await?
                    .map_or(0, |current| current.stock);
                return Err(insufficient(product, available, *quantity));
            }
            let key = CacheKey::Product(product.id);
            self.cache.delete(&key).await;
            touched.push(key);
        }

        let total_amount: Decimal = resolved
            .iter()
            .map(|(product, quantity)| line_total(product.price, *quantity))
            .sum();

        let order = tx
            .insert_order(&NewOrder {
                user_id: user_id.clone(),
                items: items
                    .iter()
                    .map(|item| OrderItem {
                        product_id: item.product_id,
                        quantity: item.quantity,
                    })
                    .collect(),
                total_amount,
            })
            .await?;

        let cleared = tx.clear_cart(user_id).await?;
        tracing::debug!(cleared, "cart cleared");

        self.cache.delete(&CacheKey::AllProducts).await;
        touched.push(CacheKey::AllProducts);

        Ok(order)
    }

    /// Cache first, then the transaction. A store hit populates the cache.
    async fn resolve_product(
        &self,
        tx: &mut dyn CheckoutTransaction,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            return Ok(Some(*product));
        }

        let product = tx.find_product(id).await?;
        if let Some(product) = &product {
            self.cache
                .set(key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }
        Ok(product)
    }
}

fn insufficient(product: &Product, available: i32, requested: u32) -> CheckoutError {
    CheckoutError::InsufficientStock {
        product_id: product.id,
        name: product.name.clone(),
        available,
        requested,
    }
}
