//! In-memory implementation of [`CommerceStore`].
//!
//! Mirrors the `PostgreSQL` semantics closely enough to exercise the
//! services without a database:
//! - cart rows must reference an existing product (foreign key)
//! - stock decrements never go below zero
//! - a checkout holds the store lock for its whole lifetime and applies its
//!   staged changes only on commit
//!
//! Product reads are counted so tests can observe cache behavior.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use quickcart_core::{
    CartItem, CartLine, NewOrder, Order, OrderId, Product, ProductId, UserId,
};

use super::{CheckoutTransaction, CommerceStore, RepositoryError};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    products: BTreeMap<ProductId, Product>,
    carts: BTreeMap<UserId, Vec<CartLine>>,
    orders: Vec<Order>,
    next_product_id: i32,
    next_order_id: i32,
}

#[derive(Debug, Default)]
struct Instruments {
    product_reads: AtomicU64,
    fail_next_order_insert: AtomicBool,
    unavailable: AtomicBool,
}

/// Store backed by process-local maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    instruments: Arc<Instruments>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product with the next free id and return it.
    pub async fn insert_product(&self, name: &str, price: Decimal, stock: i32) -> Product {
        let mut state = self.state.lock().await;
        state.next_product_id += 1;
        let product = Product {
            id: ProductId::new(state.next_product_id),
            name: name.to_string(),
            price,
            stock,
            created_at: Utc::now(),
        };
        state.products.insert(product.id, product.clone());
        product
    }

    /// Current stock of a product, bypassing the read counter.
    pub async fn stock_of(&self, id: ProductId) -> Option<i32> {
        self.state.lock().await.products.get(&id).map(|p| p.stock)
    }

    /// Every order ever placed, oldest first.
    pub async fn all_orders(&self) -> Vec<Order> {
        self.state.lock().await.orders.clone()
    }

    /// Number of product reads served so far (list or single).
    #[must_use]
    pub fn product_reads(&self) -> u64 {
        self.instruments.product_reads.load(Ordering::SeqCst)
    }

    /// Make the next order insert fail, to exercise rollback.
    pub fn fail_next_order_insert(&self) {
        self.instruments
            .fail_next_order_insert
            .store(true, Ordering::SeqCst);
    }

    /// Simulate losing the connection to the store.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.instruments.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.instruments.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn record_product_read(&self) {
        self.instruments.product_reads.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CommerceStore for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        self.check_available()?;
        self.record_product_read();
        Ok(self.state.lock().await.products.values().cloned().collect())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.check_available()?;
        self.record_product_read();
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn replace_cart(
        &self,
        user_id: &UserId,
        items: &[CartItem],
    ) -> Result<(), RepositoryError> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        let mut lines: Vec<CartLine> = Vec::with_capacity(items.len());
        for item in items {
            if !state.products.contains_key(&item.product_id) {
                return Err(RepositoryError::Conflict(format!(
                    "product {} does not exist",
                    item.product_id
                )));
            }
            if lines.iter().any(|l| l.product_id == item.product_id) {
                return Err(RepositoryError::Conflict(format!(
                    "product {} listed twice",
                    item.product_id
                )));
            }
            lines.push(CartLine {
                user_id: user_id.clone(),
                product_id: item.product_id,
                quantity: item.quantity,
            });
        }
        lines.sort_by_key(|l| l.product_id.as_i32());

        if lines.is_empty() {
            state.carts.remove(user_id);
        } else {
            state.carts.insert(user_id.clone(), lines);
        }
        Ok(())
    }

    async fn cart_lines(&self, user_id: &UserId) -> Result<Vec<CartLine>, RepositoryError> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .await
            .carts
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, RepositoryError> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|o| &o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn begin_checkout(&self) -> Result<Box<dyn CheckoutTransaction>, RepositoryError> {
        self.check_available()?;
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryCheckoutTransaction {
            guard,
            staged,
            instruments: Arc::clone(&self.instruments),
        }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check_available()
    }
}

/// A checkout against a [`MemoryStore`].
///
/// Works on a copy of the state; commit swaps the copy in.
struct MemoryCheckoutTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
    instruments: Arc<Instruments>,
}

#[async_trait]
impl CheckoutTransaction for MemoryCheckoutTransaction {
    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.instruments.product_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.staged.products.get(&id).cloned())
    }

    async fn decrement_stock(
        &mut self,
        id: ProductId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        let Some(product) = self.staged.products.get_mut(&id) else {
            return Ok(false);
        };
        if !product.has_stock_for(quantity) {
            return Ok(false);
        }
        let quantity = super::quantity_to_db(quantity)?;
        product.stock -= quantity;
        Ok(true)
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, RepositoryError> {
        if self
            .instruments
            .fail_next_order_insert
            .swap(false, Ordering::SeqCst)
        {
            return Err(RepositoryError::Unavailable(
                "order insert failed".to_string(),
            ));
        }

        self.staged.next_order_id += 1;
        let stored = Order {
            id: OrderId::new(self.staged.next_order_id),
            user_id: order.user_id.clone(),
            items: order.items.clone(),
            total_amount: order.total_amount,
            created_at: Utc::now(),
        };
        self.staged.orders.push(stored.clone());
        Ok(stored)
    }

    async fn clear_cart(&mut self, user_id: &UserId) -> Result<u64, RepositoryError> {
        let removed = self
            .staged
            .carts
            .remove(user_id)
            .map_or(0, |lines| lines.len());
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let Self {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        Ok(())
    }
}
