//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as
//! `{"error": "<message>"}` with a status derived from the variant; server
//! faults are captured to Sentry and their details kept out of the body.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use quickcart_core::api::ErrorBody;

use crate::db::RepositoryError;
use crate::services::{CartSyncError, CheckoutError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed request body or path.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Checkout was rejected or failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Cart sync was rejected or failed.
    #[error("Cart sync error: {0}")]
    CartSync(#[from] CartSyncError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart
                | CheckoutError::InvalidItems(_)
                | CheckoutError::Store(_) => StatusCode::BAD_REQUEST,
                CheckoutError::NotFound(_) => StatusCode::NOT_FOUND,
                CheckoutError::InsufficientStock { .. } => StatusCode::CONFLICT,
            },
            Self::CartSync(err) => match err {
                CartSyncError::InvalidItems(_) => StatusCode::BAD_REQUEST,
                CartSyncError::Store(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
                CartSyncError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text for the response body.
    fn message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Checkout(CheckoutError::Store(err)) => format!("Checkout failed: {err}"),
            Self::Checkout(err) => err.to_string(),
            Self::CartSync(CartSyncError::Store(RepositoryError::Conflict(msg))) => {
                format!("Cart sync failed: {msg}")
            }
            Self::CartSync(CartSyncError::InvalidItems(err)) => err.to_string(),
            // Don't expose internal error details to clients
            Self::CartSync(_) | Self::Database(_) => {
                "Internal server error".to_string()
            }
        }
    }

    /// Faults worth an alert, as opposed to rejected requests.
    const fn is_server_fault(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Checkout(CheckoutError::Store(_))
                | Self::CartSync(CartSyncError::Store(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = ErrorBody {
            error: self.message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
