//! Health check endpoints.
//!
//! - `/health/live` - Liveness check, no dependency checks
//! - `/health` - Store connectivity, cache counters and uptime

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::cache::CacheStats;
use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub cache: CacheStats,
    /// Seconds since startup.
    pub uptime: u64,
}

/// GET /health/live
pub async fn live() -> &'static str {
    "ok"
}

/// GET /health
///
/// Returns 503 when the store does not answer.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_ok = match state.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "health check: store unreachable");
            false
        }
    };

    let body = HealthResponse {
        status: if database_ok { "healthy" } else { "unhealthy" },
        database: if database_ok {
            "connected"
        } else {
            "disconnected"
        },
        cache: state.cache().stats().await,
        uptime: state.uptime().as_secs(),
    };

    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}
