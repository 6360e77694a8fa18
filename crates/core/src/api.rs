//! JSON bodies exchanged between the client and the server.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{CartItem, CartLine};
use crate::types::{OrderId, UserId};

/// A full cart as held by a client.
///
/// Used as the body of both `POST /cart/sync` and `POST /checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
}

/// Reply to a successful cart sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub success: bool,
}

/// Reply to a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub success: bool,
    pub order_id: OrderId,
    pub total_amount: Decimal,
}

/// The server-side cart for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
}

impl CartView {
    /// Build a view from persisted rows.
    #[must_use]
    pub fn from_lines(user_id: UserId, lines: &[CartLine]) -> Self {
        Self {
            user_id,
            items: lines
                .iter()
                .map(|line| CartItem::new(line.product_id, line.quantity))
                .collect(),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ProductId;

    #[test]
    fn test_snapshot_parses_client_body() {
        let body = r#"{"user_id": "user123", "items": [{"product_id": 1, "quantity": 2}]}"#;
        let snapshot: CartSnapshot = serde_json::from_str(body).unwrap();
        assert_eq!(snapshot.user_id.as_str(), "user123");
        assert_eq!(snapshot.items, vec![CartItem::new(ProductId::new(1), 2)]);
    }

    #[test]
    fn test_snapshot_requires_user_id() {
        let body = r#"{"items": []}"#;
        assert!(serde_json::from_str::<CartSnapshot>(body).is_err());
    }

    #[test]
    fn test_snapshot_requires_item_list() {
        let body = r#"{"user_id": "u", "items": {"product_id": 1}}"#;
        assert!(serde_json::from_str::<CartSnapshot>(body).is_err());
    }

    #[test]
    fn test_checkout_response_serializes_total_as_string() {
        let response = CheckoutResponse {
            success: true,
            order_id: OrderId::new(5),
            total_amount: Decimal::new(2500, 2),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["order_id"], 5);
        assert_eq!(value["total_amount"], "25.00");
    }
}
