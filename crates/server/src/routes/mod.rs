//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /products            - Product listing (cached)
//! GET  /products/{id}       - Product detail (cached)
//!
//! POST /cart/sync           - Replace the server cart with a snapshot
//! GET  /cart/{user_id}      - Persisted cart for a user
//!
//! POST /checkout            - Place an order for a snapshot
//! GET  /orders/{user_id}    - Orders for a user, newest first
//!
//! GET  /health              - Store status, cache counters, uptime
//! GET  /health/live         - Liveness check
//! ```

pub mod cart;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod products;

use std::time::Duration;

use axum::{
    Router,
    http::{Request, Response},
    middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use quickcart_core::UserId;

use crate::error::AppError;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the API routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::list))
        .route("/products/{id}", get(products::show))
        .route("/cart/sync", post(cart::sync))
        .route("/cart/{user_id}", get(cart::show))
        .route("/checkout", post(checkout::checkout))
        .route("/orders/{user_id}", get(orders::list))
        .route("/health", get(health::health))
        .route("/health/live", get(health::live))
}

/// The full application with its middleware stack, minus Sentry.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
}

/// Parse a user id taken from the path.
fn parse_user_id(raw: &str) -> Result<UserId, AppError> {
    UserId::parse(raw).map_err(|e| AppError::Validation(format!("Invalid user_id: {e}")))
}
