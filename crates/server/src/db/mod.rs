//! Durable store for products, carts and orders.
//!
//! # Tables
//!
//! - `products` - Catalog and stock levels (source of truth for availability)
//! - `cart` - One row per (user, product), replaced wholesale on every sync
//! - `orders` - Append-only order log, items stored as JSONB
//!
//! The DDL lives in `crates/server/migrations/`. The server never runs it;
//! apply it with `psql` or any migration runner before starting.
//!
//! # Backends
//!
//! - [`PgStore`] - `PostgreSQL` via `sqlx`
//! - [`MemoryStore`] - process-local maps with the same semantics, used by
//!   tests and local demos

pub mod carts;
pub mod memory;
pub mod orders;
pub mod postgres;
pub mod products;

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use thiserror::Error;

use quickcart_core::{CartItem, CartLine, NewOrder, Order, Product, ProductId, UserId};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., cart row for an unknown product).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read and write access to the durable store.
#[async_trait]
pub trait CommerceStore: Send + Sync {
    /// All products ordered by id.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// A single product, or `None` if the id is unknown.
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Delete every cart row for `user_id` and insert `items`, atomically.
    ///
    /// Items must already be coalesced (one entry per product).
    async fn replace_cart(
        &self,
        user_id: &UserId,
        items: &[CartItem],
    ) -> Result<(), RepositoryError>;

    /// Persisted cart rows for `user_id`, ordered by product id.
    async fn cart_lines(&self, user_id: &UserId) -> Result<Vec<CartLine>, RepositoryError>;

    /// Orders placed by `user_id`, newest first.
    async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, RepositoryError>;

    /// Open the transaction a checkout runs in.
    async fn begin_checkout(&self) -> Result<Box<dyn CheckoutTransaction>, RepositoryError>;

    /// Cheap connectivity check for health reports.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// The mutating steps of a checkout, all inside one store transaction.
///
/// Dropping a transaction without calling [`commit`](Self::commit) discards
/// its changes; [`rollback`](Self::rollback) does so explicitly.
#[async_trait]
pub trait CheckoutTransaction: Send {
    /// Read a product inside the transaction.
    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Take `quantity` units from stock.
    ///
    /// Returns `false` and changes nothing if that would leave stock
    /// negative.
    async fn decrement_stock(
        &mut self,
        id: ProductId,
        quantity: u32,
    ) -> Result<bool, RepositoryError>;

    /// Record an order.
    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, RepositoryError>;

    /// Remove every cart row for `user_id`. Returns the number removed.
    async fn clear_cart(&mut self, user_id: &UserId) -> Result<u64, RepositoryError>;

    /// Make every change visible.
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;

    /// Discard every change.
    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(options: PgConnectOptions) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Convert a stored quantity, rejecting values a client could never send.
pub(crate) fn quantity_from_db(quantity: i32) -> Result<u32, RepositoryError> {
    u32::try_from(quantity)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative quantity {quantity}")))
}

/// Convert a quantity for binding into an `INTEGER` column.
pub(crate) fn quantity_to_db(quantity: u32) -> Result<i32, RepositoryError> {
    i32::try_from(quantity)
        .map_err(|_| RepositoryError::Conflict(format!("quantity {quantity} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_conversions() {
        assert_eq!(quantity_from_db(3).ok(), Some(3));
        assert!(matches!(
            quantity_from_db(-1),
            Err(RepositoryError::DataCorruption(_))
        ));
        assert_eq!(quantity_to_db(7).ok(), Some(7));
        assert!(matches!(
            quantity_to_db(u32::MAX),
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(RepositoryError::NotFound.to_string(), "not found");
        assert_eq!(
            RepositoryError::Unavailable("down".to_string()).to_string(),
            "store unavailable: down"
        );
    }
}
