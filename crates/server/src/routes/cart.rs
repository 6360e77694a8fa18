//! Cart route handlers.
//!
//! The client owns the cart; these endpoints mirror it server-side.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use tracing::instrument;

use quickcart_core::api::{CartSnapshot, CartView, SyncResponse};

use super::parse_user_id;
use crate::error::Result;
use crate::state::AppState;

/// POST /cart/sync
#[instrument(skip(state, payload))]
pub async fn sync(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CartSnapshot>, JsonRejection>,
) -> Result<Json<SyncResponse>> {
    let Json(snapshot) = payload?;
    state.cart_sync().sync(&snapshot).await?;
    Ok(Json(SyncResponse { success: true }))
}

/// GET /cart/{user_id}
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Json<CartView>> {
    let user_id = parse_user_id(&raw)?;
    let view = state.cart_sync().cart(&user_id).await?;
    Ok(Json(view))
}
