//! Checkout route handler.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::instrument;

use quickcart_core::api::{CartSnapshot, CheckoutResponse};

use crate::error::Result;
use crate::state::AppState;

/// POST /checkout
///
/// Not debounced or retried; the body is the client's cart at the moment
/// checkout was pressed.
#[instrument(skip(state, payload))]
pub async fn checkout(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CartSnapshot>, JsonRejection>,
) -> Result<Json<CheckoutResponse>> {
    let Json(snapshot) = payload?;
    let order = state.checkout().checkout(&snapshot).await?;
    Ok(Json(CheckoutResponse {
        success: true,
        order_id: order.id,
        total_amount: order.total_amount,
    }))
}
