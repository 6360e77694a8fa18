//! Order queries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgExecutor;
use sqlx::types::Json;

use quickcart_core::{NewOrder, Order, OrderId, OrderItem, UserId};

use super::RepositoryError;

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: UserId,
    items: Json<Vec<OrderItem>>,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            user_id: row.user_id,
            items: row.items.0,
            total_amount: row.total_amount,
            created_at: row.created_at,
        }
    }
}

/// Insert an order and return the stored row.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert<'e, E>(executor: E, order: &NewOrder) -> Result<Order, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, OrderRow>(
        r"
        INSERT INTO orders (user_id, items, total_amount)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, items, total_amount, created_at
        ",
    )
    .bind(&order.user_id)
    .bind(Json(&order.items))
    .bind(order.total_amount)
    .fetch_one(executor)
    .await?;

    Ok(row.into())
}

/// List a user's orders, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_for_user<'e, E>(
    executor: E,
    user_id: &UserId,
) -> Result<Vec<Order>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, OrderRow>(
        r"
        SELECT id, user_id, items, total_amount, created_at
        FROM orders
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        ",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Order::from).collect())
}
