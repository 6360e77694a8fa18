//! QuickCart client.
//!
//! Keeps a local cart that updates instantly and mirrors it to the server
//! with a debounced full-cart sync.
//!
//! # Modules
//!
//! - [`local_cart`] - The quantity map the user edits
//! - [`storage`] - Saving the cart between sessions
//! - [`debounce`] - Trailing-edge debounce for syncs
//! - [`api`] - HTTP calls to the server
//! - [`controller`] - Ties the above together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod local_cart;
pub mod storage;

pub use api::{CartApi, DEFAULT_API_URL, HttpCartApi};
pub use controller::{CartController, CartSummary, SummaryLine};
pub use error::{ClientError, Result};
pub use local_cart::LocalCart;
pub use storage::{CartStorage, JsonFileStorage, MemoryStorage};
