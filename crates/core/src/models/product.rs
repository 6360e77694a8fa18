//! Catalog products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// A product in the catalog.
///
/// `stock` is only ever decremented by checkout and never observed below
/// zero in committed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whether `quantity` units can be taken from current stock.
    #[must_use]
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        i64::from(self.stock) >= i64::from(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i32) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Widget".to_string(),
            price: Decimal::new(999, 2),
            stock,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_stock_for() {
        assert!(product(5).has_stock_for(5));
        assert!(product(5).has_stock_for(1));
        assert!(!product(5).has_stock_for(6));
        assert!(!product(0).has_stock_for(1));
    }

    #[test]
    fn test_has_stock_for_huge_quantity() {
        assert!(!product(i32::MAX).has_stock_for(u32::MAX));
    }
}
