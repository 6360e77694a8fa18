//! Client error types.

use thiserror::Error;

/// Result type alias for the client crate.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body; `message` is shown as-is.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Cart storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Cart snapshot is not valid JSON: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Checkout already in progress")]
    CheckoutInProgress,

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}
