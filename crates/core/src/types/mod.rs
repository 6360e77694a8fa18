//! Core types for QuickCart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod user;

pub use id::*;
pub use price::{format_price, line_total};
pub use user::{UserId, UserIdError};
