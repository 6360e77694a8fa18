//! Server-side mirror of client carts.
//!
//! A sync replaces every row for the user with the snapshot. Stock and
//! prices are not looked at; sync is a state mirror, not a reservation.

use thiserror::Error;
use tracing::instrument;

use quickcart_core::api::{CartSnapshot, CartView};
use quickcart_core::{ItemError, UserId, coalesce_items, validate_items};

use crate::db::{CommerceStore, RepositoryError};

/// Errors that can occur while syncing a cart.
#[derive(Debug, Error)]
pub enum CartSyncError {
    /// An item carries an unusable quantity.
    #[error("{0}")]
    InvalidItems(#[from] ItemError),

    /// The store rejected or failed the replacement.
    #[error("{0}")]
    Store(#[from] RepositoryError),
}

/// Cart sync operations.
pub struct CartSyncService<'a> {
    store: &'a dyn CommerceStore,
}

impl<'a> CartSyncService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn CommerceStore) -> Self {
        Self { store }
    }

    /// Replace the user's cart with `snapshot`.
    ///
    /// Repeated product ids are merged. An empty snapshot empties the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartSyncError::InvalidItems` for a zero or oversized quantity.
    /// Returns `CartSyncError::Store` if the store fails, including when an
    /// item names a product that does not exist.
    #[instrument(skip(self, snapshot), fields(user_id = %snapshot.user_id, items = snapshot.items.len()))]
    pub async fn sync(&self, snapshot: &CartSnapshot) -> Result<(), CartSyncError> {
        validate_items(&snapshot.items)?;
        let items = coalesce_items(&snapshot.items);
        validate_items(&items)?;

        self.store.replace_cart(&snapshot.user_id, &items).await?;
        tracing::debug!(lines = items.len(), "cart replaced");
        Ok(())
    }

    /// The persisted cart for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store read fails.
    pub async fn cart(&self, user_id: &UserId) -> Result<CartView, RepositoryError> {
        let lines = self.store.cart_lines(user_id).await?;
        Ok(CartView::from_lines(user_id.clone(), &lines))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use quickcart_core::{CartItem, ProductId};

    use super::*;
    use crate::db::MemoryStore;

    fn snapshot(user: &str, items: Vec<CartItem>) -> CartSnapshot {
        CartSnapshot {
            user_id: UserId::parse(user).unwrap(),
            items,
        }
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let store = MemoryStore::new();
        let a = store.insert_product("A", Decimal::ONE, 1).await;
        let b = store.insert_product("B", Decimal::ONE, 1).await;
        let service = CartSyncService::new(&store);
        let body = snapshot("u1", vec![CartItem::new(a.id, 2), CartItem::new(b.id, 1)]);

        service.sync(&body).await.unwrap();
        let first = service.cart(&body.user_id).await.unwrap();
        service.sync(&body).await.unwrap();
        let second = service.cart(&body.user_id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.items.len(), 2);
    }

    #[tokio::test]
    async fn test_sync_does_not_check_stock() {
        let store = MemoryStore::new();
        let a = store.insert_product("A", Decimal::ONE, 0).await;
        let service = CartSyncService::new(&store);

        service
            .sync(&snapshot("u1", vec![CartItem::new(a.id, 50)]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_snapshot_empties_cart() {
        let store = MemoryStore::new();
        let a = store.insert_product("A", Decimal::ONE, 1).await;
        let service = CartSyncService::new(&store);

        service
            .sync(&snapshot("u1", vec![CartItem::new(a.id, 1)]))
            .await
            .unwrap();
        service.sync(&snapshot("u1", Vec::new())).await.unwrap();

        let view = service.cart(&UserId::parse("u1").unwrap()).await.unwrap();
        assert!(view.items.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_items_are_merged() {
        let store = MemoryStore::new();
        let a = store.insert_product("A", Decimal::ONE, 1).await;
        let service = CartSyncService::new(&store);

        service
            .sync(&snapshot(
                "u1",
                vec![CartItem::new(a.id, 1), CartItem::new(a.id, 2)],
            ))
            .await
            .unwrap();

        let view = service.cart(&UserId::parse("u1").unwrap()).await.unwrap();
        assert_eq!(view.items, vec![CartItem::new(a.id, 3)]);
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected() {
        let store = MemoryStore::new();
        let service = CartSyncService::new(&store);

        let err = service
            .sync(&snapshot("u1", vec![CartItem::new(ProductId::new(1), 0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CartSyncError::InvalidItems(_)));
    }

    #[tokio::test]
    async fn test_unknown_product_reported() {
        let store = MemoryStore::new();
        let service = CartSyncService::new(&store);

        let err = service
            .sync(&snapshot("u1", vec![CartItem::new(ProductId::new(9), 1)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CartSyncError::Store(RepositoryError::Conflict(_))
        ));
    }
}
