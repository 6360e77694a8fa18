//! Product queries.
//!
//! Runtime queries (not `query!` macros) so the crate builds without a live
//! database or an offline query cache. Every function accepts any executor,
//! so the same SQL runs against the pool or inside a transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgExecutor;

use quickcart_core::{Product, ProductId};

use super::{RepositoryError, quantity_to_db};

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    price: Decimal,
    stock: i32,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            price: row.price,
            stock: row.stock,
            created_at: row.created_at,
        }
    }
}

/// List all products ordered by id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list<'e, E>(executor: E) -> Result<Vec<Product>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, ProductRow>(
        r"
        SELECT id, name, price, stock, created_at
        FROM products
        ORDER BY id
        ",
    )
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Product::from).collect())
}

/// Get a product by id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_id<'e, E>(
    executor: E,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, ProductRow>(
        r"
        SELECT id, name, price, stock, created_at
        FROM products
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Product::from))
}

/// Take `quantity` units from a product's stock.
///
/// The `stock >= $1` guard keeps stock non-negative even when the caller
/// validated against a stale read. Returns `false` when no row changed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn decrement_stock<'e, E>(
    executor: E,
    id: ProductId,
    quantity: u32,
) -> Result<bool, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r"
        UPDATE products
        SET stock = stock - $1
        WHERE id = $2 AND stock >= $1
        ",
    )
    .bind(quantity_to_db(quantity)?)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}
