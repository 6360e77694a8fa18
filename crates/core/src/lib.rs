//! QuickCart Core - Shared types library.
//!
//! This crate provides common types used across all QuickCart components:
//! - `server` - JSON API over the product, cart and order store
//! - `client` - Local cart controller that mirrors carts to the server
//! - `cli` - Terminal front end for the client
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and money helpers
//! - [`models`] - Products, cart items and orders
//! - [`api`] - Request and response bodies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
