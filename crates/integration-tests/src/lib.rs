//! Integration tests for QuickCart.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no database needed)
//! cargo test -p quickcart-integration-tests
//!
//! # Against a running server
//! QUICKCART_API_URL=http://localhost:3000 \
//!     cargo test -p quickcart-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - Product listing, detail, caching and health
//! - `cart` - Cart sync and read-back
//! - `checkout` - Orders, stock and rollback
//! - `client` - The cart controller against a served app
//! - `live` - Smoke tests against a real deployment (ignored by default)

// Harness code: failures here are test failures.
#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::ServiceExt;

use quickcart_core::{Product, api::ErrorBody};
use quickcart_server::cache::MemoryReadCache;
use quickcart_server::db::MemoryStore;
use quickcart_server::routes;
use quickcart_server::state::AppState;

/// Cache lifetime used by every test app.
pub const TEST_CACHE_TTL: Duration = Duration::from_secs(60);

/// The full router over an in-memory store.
pub struct TestApp {
    pub store: MemoryStore,
    pub cache: Arc<MemoryReadCache>,
    router: Router,
}

impl TestApp {
    /// An app with an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let cache = Arc::new(MemoryReadCache::new(TEST_CACHE_TTL));
        let state = AppState::new(Arc::new(store.clone()), cache.clone());
        Self {
            store,
            cache,
            router: routes::app(state),
        }
    }

    /// An app with three products:
    ///
    /// | id | name   | price | stock |
    /// |----|--------|-------|-------|
    /// | 1  | Widget | 9.99  | 5     |
    /// | 2  | Gadget | 12.50 | 3     |
    /// | 3  | Gizmo  | 2.00  | 0     |
    pub async fn seeded() -> Self {
        let app = Self::new();
        app.add_product("Widget", Decimal::new(999, 2), 5).await;
        app.add_product("Gadget", Decimal::new(1250, 2), 3).await;
        app.add_product("Gizmo", Decimal::new(200, 2), 0).await;
        app
    }

    pub async fn add_product(&self, name: &str, price: Decimal, stock: i32) -> Product {
        self.store.insert_product(name, price, stock).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::get(uri)
            .body(Body::empty())
            .expect("valid request");
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> TestResponse {
        self.post_raw(uri, body.to_string()).await
    }

    /// POST a body as-is with a JSON content type.
    pub async fn post_raw(&self, uri: &str, body: impl Into<Body>) -> TestResponse {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .expect("valid request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("body collects")
            .to_bytes();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Serve the app on an ephemeral local port and return its base URL.
    pub async fn serve(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("bound address");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("server runs");
        });
        format!("http://{addr}")
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Decode the body.
    #[must_use]
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "body is not the expected JSON ({e}): {}",
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    #[must_use]
    pub fn value(&self) -> Value {
        self.json()
    }

    /// The `error` field of an error body.
    #[must_use]
    pub fn error(&self) -> String {
        self.json::<ErrorBody>().error
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
