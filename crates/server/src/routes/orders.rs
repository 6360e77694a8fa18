//! Order history route handler.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use quickcart_core::Order;

use super::parse_user_id;
use crate::error::Result;
use crate::state::AppState;

/// GET /orders/{user_id}
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Json<Vec<Order>>> {
    let user_id = parse_user_id(&raw)?;
    let orders = state.store().orders_for_user(&user_id).await?;
    Ok(Json(orders))
}
