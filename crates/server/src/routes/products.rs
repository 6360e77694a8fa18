//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use quickcart_core::{Product, ProductId};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// GET /products
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().list_products().await?;
    Ok(Json(products))
}

/// GET /products/{id}
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Json<Product>> {
    let id: ProductId = raw
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid product id: {raw}")))?;

    state
        .catalog()
        .get_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))
}
