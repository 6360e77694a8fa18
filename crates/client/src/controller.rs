//! Client-side cart controller.
//!
//! Edits apply to the local cart at once, are saved locally at once, and
//! reach the server through a debounced full-cart sync. The local cart is
//! authoritative for the client: a failed sync is recorded and retried by
//! the next edit, never rolled back.
//!
//! Checkout is sent immediately. While it is in flight every mutation
//! fails with [`ClientError::CheckoutInProgress`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rust_decimal::Decimal;

use quickcart_core::api::{CartSnapshot, CheckoutResponse};
use quickcart_core::{CartItem, Order, Product, ProductId, UserId, line_total};

use crate::api::CartApi;
use crate::debounce::Debouncer;
use crate::error::{ClientError, Result};
use crate::local_cart::LocalCart;
use crate::storage::CartStorage;

/// Quiet period before local edits are pushed to the server.
pub const SYNC_DEBOUNCE: Duration = Duration::from_secs(1);

/// One line of [`CartSummary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub product_id: ProductId,
    /// `None` until the catalog has been loaded.
    pub name: Option<String>,
    pub quantity: u32,
    pub line_total: Option<Decimal>,
}

/// What the user sees: lines, unit count and running total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub lines: Vec<SummaryLine>,
    pub item_count: u64,
    /// Sum of the lines with a known price.
    pub total: Decimal,
}

struct ControllerState {
    cart: LocalCart,
    catalog: BTreeMap<ProductId, Product>,
    checkout_in_progress: bool,
}

/// Owns the local cart and keeps the server copy in step.
pub struct CartController {
    user_id: UserId,
    state: Mutex<ControllerState>,
    storage: Box<dyn CartStorage>,
    api: Arc<dyn CartApi>,
    sync: Debouncer<CartSnapshot>,
    last_sync_error: Arc<Mutex<Option<String>>>,
}

impl CartController {
    /// Load the saved cart and wire up the debounced sync.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the saved cart cannot be loaded.
    pub fn new(
        user_id: UserId,
        api: Arc<dyn CartApi>,
        storage: Box<dyn CartStorage>,
    ) -> Result<Self> {
        let cart = storage.load()?;
        let last_sync_error = Arc::new(Mutex::new(None));

        let sync = {
            let api = Arc::clone(&api);
            let last_error = Arc::clone(&last_sync_error);
            Debouncer::new(SYNC_DEBOUNCE, move |snapshot: CartSnapshot| {
                let api = Arc::clone(&api);
                let last_error = Arc::clone(&last_error);
                async move {
                    let outcome = api.sync_cart(&snapshot).await;
                    let mut slot = last_error.lock().unwrap_or_else(PoisonError::into_inner);
                    match outcome {
                        Ok(()) => {
                            tracing::debug!(items = snapshot.items.len(), "cart synced");
                            *slot = None;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "cart sync failed");
                            *slot = Some(e.to_string());
                        }
                    }
                }
            })
        };

        Ok(Self {
            user_id,
            state: Mutex::new(ControllerState {
                cart,
                catalog: BTreeMap::new(),
                checkout_in_progress: false,
            }),
            storage,
            api,
            sync,
            last_sync_error,
        })
    }

    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Fetch the catalog so summaries can show names and prices.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    pub async fn load_products(&self) -> Result<Vec<Product>> {
        let products = self.api.list_products().await?;
        self.lock().catalog = products.iter().map(|p| (p.id, p.clone())).collect();
        Ok(products)
    }

    /// Adopt the server cart when the local one is empty.
    ///
    /// Returns whether anything was adopted.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request or the local save fails.
    pub async fn restore_from_server(&self) -> Result<bool> {
        if !self.lock().cart.is_empty() {
            return Ok(false);
        }
        let view = self.api.fetch_cart(&self.user_id).await?;
        let mut state = self.lock();
        if !state.cart.is_empty() || view.items.is_empty() {
            return Ok(false);
        }
        state.cart = LocalCart::from_items(&view.items);
        self.storage.save(&state.cart)?;
        Ok(true)
    }

    /// Add `quantity` units of a product. Returns the new line quantity.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::CheckoutInProgress` during checkout,
    /// `ClientError::InvalidQuantity` for zero, or a storage error.
    pub fn add(&self, product_id: ProductId, quantity: u32) -> Result<u32> {
        self.mutate(|cart| cart.add(product_id, quantity))
    }

    /// Take one unit away. Returns what is left of the line.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::CheckoutInProgress` during checkout, or a
    /// storage error.
    pub fn remove(&self, product_id: ProductId) -> Result<u32> {
        self.mutate(|cart| Ok(cart.remove_one(product_id)))
    }

    /// Set a line's quantity; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::CheckoutInProgress` during checkout, or a
    /// storage error.
    pub fn set_quantity(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        self.mutate(|cart| {
            cart.set_quantity(product_id, quantity);
            Ok(())
        })
    }

    /// Drop a line entirely.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::CheckoutInProgress` during checkout, or a
    /// storage error.
    pub fn remove_line(&self, product_id: ProductId) -> Result<bool> {
        self.mutate(|cart| Ok(cart.remove_line(product_id)))
    }

    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.lock().cart.items()
    }

    /// Lines, unit count and total from the loaded catalog.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        let state = self.lock();
        let lines: Vec<SummaryLine> = state
            .cart
            .items()
            .into_iter()
            .map(|item| {
                let product = state.catalog.get(&item.product_id);
                SummaryLine {
                    product_id: item.product_id,
                    name: product.map(|p| p.name.clone()),
                    quantity: item.quantity,
                    line_total: product.map(|p| line_total(p.price, item.quantity)),
                }
            })
            .collect();
        let total: Decimal = lines.iter().filter_map(|line| line.line_total).sum();

        CartSummary {
            lines,
            item_count: state.cart.item_count(),
            total,
        }
    }

    /// Place an order for the current cart.
    ///
    /// A pending sync is dropped and a sync already on the wire is waited
    /// for, so no sync can land after the order. On success the local cart
    /// is cleared; on failure it is left as it was and a sync is scheduled
    /// again.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::CheckoutInProgress` if a checkout is already
    /// running, `ClientError::Api` with the server's message if the order
    /// is rejected, or a transport error.
    pub async fn checkout(&self) -> Result<CheckoutResponse> {
        {
            let mut state = self.lock();
            if state.checkout_in_progress {
                return Err(ClientError::CheckoutInProgress);
            }
            state.checkout_in_progress = true;
        }
        // Mutations are blocked from here on, so nothing can re-arm the sync.
        self.sync.cancel_and_wait().await;
        let snapshot = self.snapshot_of(&self.lock().cart);

        let outcome = self.api.checkout(&snapshot).await;

        let mut state = self.lock();
        state.checkout_in_progress = false;
        match outcome {
            Ok(response) => {
                state.cart.clear();
                // The order exists either way; a stale file is only logged.
                if let Err(e) = self.storage.save(&state.cart) {
                    tracing::error!(
                        order_id = %response.order_id,
                        error = %e,
                        "order placed but the emptied cart could not be saved"
                    );
                }
                tracing::info!(order_id = %response.order_id, "checkout complete");
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(error = %e, "checkout failed");
                self.sync.schedule(snapshot);
                Err(e)
            }
        }
    }

    /// This user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    pub async fn orders(&self) -> Result<Vec<Order>> {
        self.api.list_orders(&self.user_id).await
    }

    /// Push any pending sync now instead of waiting for the timer.
    pub async fn flush_sync(&self) {
        self.sync.flush().await;
    }

    #[must_use]
    pub fn sync_pending(&self) -> bool {
        self.sync.is_pending()
    }

    /// Message of the most recent failed sync, cleared by the next success.
    #[must_use]
    pub fn last_sync_error(&self) -> Option<String> {
        self.last_sync_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn mutate<T>(&self, edit: impl FnOnce(&mut LocalCart) -> Result<T>) -> Result<T> {
        let mut state = self.lock();
        if state.checkout_in_progress {
            return Err(ClientError::CheckoutInProgress);
        }
        let outcome = edit(&mut state.cart)?;
        self.storage.save(&state.cart)?;
        self.sync.schedule(self.snapshot_of(&state.cart));
        Ok(outcome)
    }

    fn snapshot_of(&self, cart: &LocalCart) -> CartSnapshot {
        CartSnapshot {
            user_id: self.user_id.clone(),
            items: cart.items(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use quickcart_core::OrderId;
    use quickcart_core::api::CartView;
    use tokio::sync::Notify;

    use super::*;
    use crate::storage::MemoryStorage;

    #[derive(Default)]
    struct FakeApi {
        products: Vec<Product>,
        syncs: Mutex<Vec<CartSnapshot>>,
        checkouts: Mutex<Vec<CartSnapshot>>,
        reject_checkout: Option<String>,
        fail_sync: bool,
        sync_delay: Option<Duration>,
        gate: Option<Arc<Notify>>,
        /// Completed syncs at the moment each checkout arrived.
        syncs_seen_by_checkout: Mutex<Vec<usize>>,
    }

    impl FakeApi {
        fn syncs(&self) -> Vec<CartSnapshot> {
            self.syncs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CartApi for FakeApi {
        async fn list_products(&self) -> Result<Vec<Product>> {
            Ok(self.products.clone())
        }

        async fn fetch_cart(&self, user_id: &UserId) -> Result<CartView> {
            Ok(CartView {
                user_id: user_id.clone(),
                items: vec![CartItem::new(ProductId::new(1), 4)],
            })
        }

        async fn sync_cart(&self, snapshot: &CartSnapshot) -> Result<()> {
            if let Some(delay) = self.sync_delay {
                tokio::time::sleep(delay).await;
            }
            self.syncs.lock().unwrap().push(snapshot.clone());
            if self.fail_sync {
                return Err(ClientError::Api {
                    status: 500,
                    message: "Internal server error".to_string(),
                });
            }
            Ok(())
        }

        async fn checkout(&self, snapshot: &CartSnapshot) -> Result<CheckoutResponse> {
            self.checkouts.lock().unwrap().push(snapshot.clone());
            let completed = self.syncs.lock().unwrap().len();
            self.syncs_seen_by_checkout.lock().unwrap().push(completed);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(message) = &self.reject_checkout {
                return Err(ClientError::Api {
                    status: 409,
                    message: message.clone(),
                });
            }
            Ok(CheckoutResponse {
                success: true,
                order_id: OrderId::new(1),
                total_amount: Decimal::ZERO,
            })
        }

        async fn list_orders(&self, _user_id: &UserId) -> Result<Vec<Order>> {
            Ok(Vec::new())
        }
    }

    fn product(id: i32, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Decimal::new(cents, 2),
            stock: 10,
            created_at: Utc::now(),
        }
    }

    fn controller(api: &Arc<FakeApi>) -> CartController {
        let api: Arc<dyn CartApi> = api.clone();
        CartController::new(
            UserId::parse("user123").unwrap(),
            api,
            Box::new(MemoryStorage::new()),
        )
        .unwrap()
    }

    const P1: ProductId = ProductId::new(1);
    const P2: ProductId = ProductId::new(2);

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_sync_once_with_final_cart() {
        let api = Arc::new(FakeApi::default());
        let ctl = controller(&api);

        ctl.add(P1, 1).unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        ctl.add(P1, 1).unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        ctl.add(P2, 3).unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let syncs = api.syncs();
        assert_eq!(syncs.len(), 1);
        assert_eq!(
            syncs[0].items,
            vec![CartItem::new(P1, 2), CartItem::new(P2, 3)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_summary_updates_immediately() {
        let api = Arc::new(FakeApi {
            products: vec![product(1, 999), product(2, 500)],
            ..FakeApi::default()
        });
        let ctl = controller(&api);
        ctl.load_products().await.unwrap();

        ctl.add(P1, 2).unwrap();
        ctl.add(P2, 1).unwrap();
        let summary = ctl.summary();

        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.total, Decimal::new(2498, 2));
        assert_eq!(summary.lines[0].name.as_deref(), Some("Product 1"));
        assert!(api.syncs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_checkout_clears_cart_and_drops_pending_sync() {
        let api = Arc::new(FakeApi::default());
        let ctl = controller(&api);
        ctl.add(P1, 2).unwrap();

        let response = ctl.checkout().await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(response.success);
        assert!(ctl.items().is_empty());
        assert!(api.syncs().is_empty());
        assert_eq!(api.checkouts.lock().unwrap()[0].items, vec![CartItem::new(P1, 2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_checkout_keeps_cart_and_surfaces_message() {
        let message = "Insufficient stock for Widget. Available: 5, Requested: 6";
        let api = Arc::new(FakeApi {
            reject_checkout: Some(message.to_string()),
            ..FakeApi::default()
        });
        let ctl = controller(&api);
        ctl.add(P1, 6).unwrap();

        let err = ctl.checkout().await.unwrap_err();
        assert_eq!(err.to_string(), message);
        assert_eq!(ctl.items(), vec![CartItem::new(P1, 6)]);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(api.syncs().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_blocked_during_checkout() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(FakeApi {
            gate: Some(Arc::clone(&gate)),
            ..FakeApi::default()
        });
        let ctl = Arc::new(controller(&api));
        ctl.add(P1, 1).unwrap();

        let running = {
            let ctl = Arc::clone(&ctl);
            tokio::spawn(async move { ctl.checkout().await })
        };
        tokio::task::yield_now().await;

        assert!(matches!(ctl.add(P1, 1), Err(ClientError::CheckoutInProgress)));
        assert!(matches!(ctl.checkout().await, Err(ClientError::CheckoutInProgress)));

        gate.notify_one();
        running.await.unwrap().unwrap();
        assert!(ctl.add(P1, 1).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_failure_recorded_and_local_cart_kept() {
        let api = Arc::new(FakeApi {
            fail_sync: true,
            ..FakeApi::default()
        });
        let ctl = controller(&api);
        ctl.add(P1, 1).unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(ctl.last_sync_error().as_deref(), Some("Internal server error"));
        assert_eq!(ctl.items(), vec![CartItem::new(P1, 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_from_server_only_when_empty() {
        let api = Arc::new(FakeApi::default());
        let ctl = controller(&api);

        assert!(ctl.restore_from_server().await.unwrap());
        assert_eq!(ctl.items(), vec![CartItem::new(P1, 4)]);
        assert!(!ctl.restore_from_server().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_sends_pending_sync() {
        let api = Arc::new(FakeApi::default());
        let ctl = controller(&api);
        ctl.add(P2, 1).unwrap();
        assert!(ctl.sync_pending());

        ctl.flush_sync().await;

        assert!(!ctl.sync_pending());
        assert_eq!(api.syncs().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkout_waits_for_sync_on_the_wire() {
        let api = Arc::new(FakeApi {
            sync_delay: Some(Duration::from_millis(300)),
            ..FakeApi::default()
        });
        let ctl = controller(&api);
        ctl.add(P1, 2).unwrap();

        // The debounce timer has fired and the sync is mid-request.
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(api.syncs().is_empty());

        ctl.checkout().await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(*api.syncs_seen_by_checkout.lock().unwrap(), vec![1]);
        assert_eq!(api.syncs().len(), 1);
        assert!(ctl.items().is_empty());
    }

    struct FlakyStorage {
        inner: MemoryStorage,
        fail_saves: Arc<AtomicBool>,
    }

    impl CartStorage for FlakyStorage {
        fn load(&self) -> Result<LocalCart> {
            self.inner.load()
        }

        fn save(&self, cart: &LocalCart) -> Result<()> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(ClientError::Storage(std::io::Error::other("disk full")));
            }
            self.inner.save(cart)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_placed_order_reported_even_if_save_fails() {
        let api = Arc::new(FakeApi::default());
        let fail_saves = Arc::new(AtomicBool::new(false));
        let storage = FlakyStorage {
            inner: MemoryStorage::new(),
            fail_saves: Arc::clone(&fail_saves),
        };
        let dyn_api: Arc<dyn CartApi> = api.clone();
        let ctl =
            CartController::new(UserId::parse("user123").unwrap(), dyn_api, Box::new(storage))
                .unwrap();
        ctl.add(P1, 1).unwrap();
        fail_saves.store(true, Ordering::SeqCst);

        let response = ctl.checkout().await.unwrap();

        assert_eq!(response.order_id, OrderId::new(1));
        assert!(ctl.items().is_empty());
    }
}
