//! Cart items and the validation shared by sync and checkout.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ProductId, UserId};

/// A product and quantity as sent by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartItem {
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// A persisted cart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Item list validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("quantity for product {0} must be at least 1")]
    ZeroQuantity(ProductId),
    #[error("quantity for product {0} is too large")]
    QuantityTooLarge(ProductId),
}

/// Check that every item carries a positive quantity that fits the store.
///
/// # Errors
///
/// Returns the first offending item.
pub fn validate_items(items: &[CartItem]) -> Result<(), ItemError> {
    for item in items {
        if item.quantity == 0 {
            return Err(ItemError::ZeroQuantity(item.product_id));
        }
        if i32::try_from(item.quantity).is_err() {
            return Err(ItemError::QuantityTooLarge(item.product_id));
        }
    }
    Ok(())
}

/// Merge repeated product ids, summing their quantities.
///
/// Keeps the position of each product's first occurrence.
#[must_use]
pub fn coalesce_items(items: &[CartItem]) -> Vec<CartItem> {
    let mut merged: Vec<CartItem> = Vec::with_capacity(items.len());
    for item in items {
        match merged.iter_mut().find(|m| m.product_id == item.product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
            None => merged.push(*item),
        }
    }
    merged
}

/// Total number of units across `items`.
#[must_use]
pub fn total_quantity(items: &[CartItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity)).sum()
}
