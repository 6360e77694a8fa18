//! The cart controller talking HTTP to a served app.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;

use quickcart_client::{CartController, ClientError, HttpCartApi, MemoryStorage};
use quickcart_core::api::CartView;
use quickcart_core::{CartItem, ProductId, UserId};
use quickcart_integration_tests::TestApp;

async fn controller_for(app: &TestApp, user: &str) -> CartController {
    let base_url = app.serve().await;
    let api = Arc::new(HttpCartApi::new(&base_url).unwrap());
    CartController::new(
        UserId::parse(user).unwrap(),
        api,
        Box::new(MemoryStorage::new()),
    )
    .unwrap()
}

fn item(product_id: i32, quantity: u32) -> CartItem {
    CartItem::new(ProductId::new(product_id), quantity)
}

#[tokio::test]
async fn test_edits_reach_server_cart() {
    let app = TestApp::seeded().await;
    let controller = controller_for(&app, "alice").await;

    controller.add(ProductId::new(1), 2).unwrap();
    controller.add(ProductId::new(2), 1).unwrap();
    controller.remove(ProductId::new(1)).unwrap();
    controller.flush_sync().await;

    assert!(controller.last_sync_error().is_none());
    let view: CartView = app.get("/cart/alice").await.json();
    assert_eq!(view.items, vec![item(1, 1), item(2, 1)]);
}

#[tokio::test]
async fn test_checkout_round_trip() {
    let app = TestApp::seeded().await;
    let controller = controller_for(&app, "alice").await;

    controller.add(ProductId::new(1), 2).unwrap();
    let response = controller.checkout().await.unwrap();

    assert!(response.success);
    assert_eq!(response.total_amount, Decimal::new(1998, 2));
    assert!(controller.items().is_empty());
    assert!(!controller.sync_pending());
    assert_eq!(app.store.stock_of(ProductId::new(1)).await, Some(3));

    let orders = controller.orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, response.order_id);
}

#[tokio::test]
async fn test_rejected_checkout_surfaces_server_message() {
    let app = TestApp::seeded().await;
    let controller = controller_for(&app, "alice").await;

    controller.add(ProductId::new(1), 6).unwrap();
    let err = controller.checkout().await.unwrap_err();

    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 409);
            assert_eq!(
                message,
                "Insufficient stock for Widget. Available: 5, Requested: 6"
            );
        }
        other => panic!("expected an API error, got {other:?}"),
    }
    assert_eq!(controller.items(), vec![item(1, 6)]);
    assert!(controller.sync_pending());
}

#[tokio::test]
async fn test_summary_uses_server_prices() {
    let app = TestApp::seeded().await;
    let controller = controller_for(&app, "alice").await;

    controller.load_products().await.unwrap();
    controller.add(ProductId::new(1), 1).unwrap();
    controller.add(ProductId::new(2), 2).unwrap();

    let summary = controller.summary();
    assert_eq!(summary.item_count, 3);
    assert_eq!(summary.total, Decimal::new(3499, 2));
    assert_eq!(summary.lines[0].name.as_deref(), Some("Widget"));
}

#[tokio::test]
async fn test_restore_adopts_server_cart() {
    let app = TestApp::seeded().await;
    app.post_json(
        "/cart/sync",
        &json!({"user_id": "alice", "items": [{"product_id": 2, "quantity": 2}]}),
    )
    .await;
    let controller = controller_for(&app, "alice").await;

    assert!(controller.restore_from_server().await.unwrap());
    assert_eq!(controller.items(), vec![item(2, 2)]);
}

#[tokio::test]
async fn test_sync_of_unknown_product_is_recorded() {
    let app = TestApp::seeded().await;
    let controller = controller_for(&app, "alice").await;

    controller.add(ProductId::new(99), 1).unwrap();
    controller.flush_sync().await;

    let error = controller.last_sync_error().unwrap();
    assert!(error.starts_with("Cart sync failed:"), "{error}");
    // The local cart keeps the line.
    assert_eq!(controller.items(), vec![item(99, 1)]);
}

#[tokio::test]
async fn test_user_ids_with_url_characters_stay_separate() {
    let app = TestApp::seeded().await;
    app.post_json(
        "/cart/sync",
        &json!({"user_id": "alice", "items": [{"product_id": 2, "quantity": 2}]}),
    )
    .await;
    let tricky = controller_for(&app, "alice?x=1").await;

    assert!(!tricky.restore_from_server().await.unwrap());
    tricky.add(ProductId::new(1), 1).unwrap();
    tricky.flush_sync().await;
    assert!(tricky.last_sync_error().is_none());

    let view: CartView = app.get("/cart/alice%3Fx=1").await.json();
    assert_eq!(view.items, vec![item(1, 1)]);
    let alice: CartView = app.get("/cart/alice").await.json();
    assert_eq!(alice.items, vec![item(2, 2)]);

    let team = controller_for(&app, "team/a").await;
    team.add(ProductId::new(2), 1).unwrap();
    team.checkout().await.unwrap();
    assert_eq!(team.orders().await.unwrap().len(), 1);
}
