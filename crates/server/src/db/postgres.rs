//! `PostgreSQL` implementation of [`CommerceStore`].

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use quickcart_core::{CartItem, CartLine, NewOrder, Order, Product, ProductId, UserId};

use super::{CheckoutTransaction, CommerceStore, RepositoryError, carts, orders, products};

/// Store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommerceStore for PgStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        products::list(&self.pool).await
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        products::find_by_id(&self.pool, id).await
    }

    #[instrument(skip(self, items), fields(user_id = %user_id, items = items.len()))]
    async fn replace_cart(
        &self,
        user_id: &UserId,
        items: &[CartItem],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        carts::delete_for_user(&mut *tx, user_id).await?;
        carts::insert_items(&mut *tx, user_id, items).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn cart_lines(&self, user_id: &UserId) -> Result<Vec<CartLine>, RepositoryError> {
        carts::lines_for_user(&self.pool, user_id).await
    }

    async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, RepositoryError> {
        orders::list_for_user(&self.pool, user_id).await
    }

    async fn begin_checkout(&self) -> Result<Box<dyn CheckoutTransaction>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgCheckoutTransaction { tx }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// A checkout running inside one `PostgreSQL` transaction.
///
/// `sqlx` rolls the transaction back if this is dropped uncommitted.
struct PgCheckoutTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CheckoutTransaction for PgCheckoutTransaction {
    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        products::find_by_id(&mut *self.tx, id).await
    }

    async fn decrement_stock(
        &mut self,
        id: ProductId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        products::decrement_stock(&mut *self.tx, id, quantity).await
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, RepositoryError> {
        orders::insert(&mut *self.tx, order).await
    }

    async fn clear_cart(&mut self, user_id: &UserId) -> Result<u64, RepositoryError> {
        carts::delete_for_user(&mut *self.tx, user_id).await
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
