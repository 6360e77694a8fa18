//! The client's own copy of the cart.
//!
//! Mutations are synchronous and never touch the network. The server copy
//! is overwritten from [`LocalCart::items`] on every sync.

use std::collections::BTreeMap;

use quickcart_core::{CartItem, ProductId};

use crate::error::{ClientError, Result};

/// Quantities keyed by product, ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalCart {
    lines: BTreeMap<ProductId, u32>,
}

impl LocalCart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from a snapshot, merging repeated products and
    /// dropping zero quantities.
    #[must_use]
    pub fn from_items(items: &[CartItem]) -> Self {
        let mut cart = Self::new();
        for item in items.iter().filter(|item| item.quantity > 0) {
            let line = cart.lines.entry(item.product_id).or_default();
            *line = line.saturating_add(item.quantity);
        }
        cart
    }

    /// Add `quantity` units. Returns the new line quantity.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidQuantity` if `quantity` is zero.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) -> Result<u32> {
        if quantity == 0 {
            return Err(ClientError::InvalidQuantity(
                "quantity to add must be at least 1".to_string(),
            ));
        }
        let line = self.lines.entry(product_id).or_default();
        *line = line.saturating_add(quantity);
        Ok(*line)
    }

    /// Take one unit away, dropping the line at zero. Returns what is left.
    pub fn remove_one(&mut self, product_id: ProductId) -> u32 {
        match self.lines.get_mut(&product_id) {
            Some(line) if *line > 1 => {
                *line -= 1;
                *line
            }
            Some(_) => {
                self.lines.remove(&product_id);
                0
            }
            None => 0,
        }
    }

    /// Set a line's quantity. Zero removes the line.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.lines.remove(&product_id);
        } else {
            self.lines.insert(product_id, quantity);
        }
    }

    /// Drop a line entirely. Returns whether it was present.
    pub fn remove_line(&mut self, product_id: ProductId) -> bool {
        self.lines.remove(&product_id).is_some()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn quantity(&self, product_id: ProductId) -> u32 {
        self.lines.get(&product_id).copied().unwrap_or(0)
    }

    /// Every line as a sync payload item.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.lines
            .iter()
            .map(|(id, quantity)| CartItem::new(*id, *quantity))
            .collect()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.values().map(|q| u64::from(*q)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(n: i32) -> ProductId {
        ProductId::new(n)
    }

    #[test]
    fn test_add_accumulates() {
        let mut cart = LocalCart::new();
        assert_eq!(cart.add(id(1), 1).unwrap(), 1);
        assert_eq!(cart.add(id(1), 2).unwrap(), 3);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_add_zero_rejected() {
        let mut cart = LocalCart::new();
        assert!(matches!(
            cart.add(id(1), 0),
            Err(ClientError::InvalidQuantity(_))
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_one_drops_line_at_zero() {
        let mut cart = LocalCart::new();
        cart.add(id(1), 2).unwrap();
        assert_eq!(cart.remove_one(id(1)), 1);
        assert_eq!(cart.remove_one(id(1)), 0);
        assert!(cart.is_empty());
        assert_eq!(cart.remove_one(id(1)), 0);
    }

    #[test]
    fn test_items_ordered_by_product() {
        let mut cart = LocalCart::new();
        cart.add(id(3), 1).unwrap();
        cart.add(id(1), 4).unwrap();
        cart.set_quantity(id(2), 2);
        cart.set_quantity(id(3), 0);

        assert_eq!(
            cart.items(),
            vec![CartItem::new(id(1), 4), CartItem::new(id(2), 2)]
        );
    }

    #[test]
    fn test_from_items_merges_and_skips_zero() {
        let cart = LocalCart::from_items(&[
            CartItem::new(id(1), 1),
            CartItem::new(id(2), 0),
            CartItem::new(id(1), 2),
        ]);
        assert_eq!(cart.items(), vec![CartItem::new(id(1), 3)]);
    }
}
