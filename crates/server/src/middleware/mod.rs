//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, outermost)
//! 2. `TraceLayer` (request span with an empty `request_id` field)
//! 3. Request ID (fills the span field, tags Sentry, echoes the header)
//! 4. CORS (any origin, JSON API only)

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
