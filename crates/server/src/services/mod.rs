//! Business logic for the API.
//!
//! # Services
//!
//! - `catalog` - Product reads through the read cache
//! - `cart_sync` - Wholesale replacement of a user's server-side cart
//! - `checkout` - Stock validation, decrement, order creation and cart clear
//!   inside one store transaction
//!
//! Services borrow the store and cache from [`AppState`](crate::state::AppState)
//! and are cheap to build per request.

pub mod cart_sync;
pub mod catalog;
pub mod checkout;

pub use cart_sync::{CartSyncError, CartSyncService};
pub use catalog::CatalogService;
pub use checkout::{CheckoutError, CheckoutPhase, CheckoutService};
