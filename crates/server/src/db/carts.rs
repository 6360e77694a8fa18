//! Cart queries.

use sqlx::{PgConnection, PgExecutor};

use quickcart_core::{CartItem, CartLine, ProductId, UserId};

use super::{RepositoryError, quantity_from_db, quantity_to_db};

/// Internal row type for cart queries.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    user_id: UserId,
    product_id: i32,
    quantity: i32,
}

impl TryFrom<CartRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: row.user_id,
            product_id: ProductId::new(row.product_id),
            quantity: quantity_from_db(row.quantity)?,
        })
    }
}

/// Get the cart rows for a user.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if a stored quantity is negative.
pub async fn lines_for_user<'e, E>(
    executor: E,
    user_id: &UserId,
) -> Result<Vec<CartLine>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, CartRow>(
        r"
        SELECT user_id, product_id, quantity
        FROM cart
        WHERE user_id = $1
        ORDER BY product_id
        ",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(CartLine::try_from).collect()
}

/// Delete every cart row for a user.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn delete_for_user<'e, E>(executor: E, user_id: &UserId) -> Result<u64, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM cart WHERE user_id = $1")
        .bind(user_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Insert cart rows for a user, one statement per item.
///
/// Runs on a connection so callers can wrap it in a transaction together
/// with [`delete_for_user`].
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if an item references an unknown
/// product or repeats a product id.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn insert_items(
    conn: &mut PgConnection,
    user_id: &UserId,
    items: &[CartItem],
) -> Result<(), RepositoryError> {
    for item in items {
        sqlx::query(
            r"
            INSERT INTO cart (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(user_id)
        .bind(item.product_id)
        .bind(quantity_to_db(item.quantity)?)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_foreign_key_violation() {
                    return RepositoryError::Conflict(format!(
                        "product {} does not exist",
                        item.product_id
                    ));
                }
                if db_err.is_unique_violation() {
                    return RepositoryError::Conflict(format!(
                        "product {} listed twice",
                        item.product_id
                    ));
                }
            }
            RepositoryError::Database(e)
        })?;
    }

    Ok(())
}
