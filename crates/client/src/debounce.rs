//! Trailing-edge debounce for outbound cart syncs.
//!
//! Each [`Debouncer::schedule`] replaces the payload and restarts the quiet
//! period, so a burst of edits produces one action call carrying the last
//! payload. At most one timer is pending at a time, and at most one action
//! call runs at a time.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

type Action<P> = Arc<dyn Fn(P) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

struct DebounceState<P> {
    pending_timer: Option<JoinHandle<()>>,
    latest_payload: Option<P>,
    /// Bumped by every schedule/cancel/flush so a superseded timer that
    /// already woke up leaves the payload alone.
    generation: u64,
}

/// Runs an async action once input has been quiet for `delay`.
///
/// Must be used inside a tokio runtime.
pub struct Debouncer<P> {
    delay: Duration,
    state: Arc<Mutex<DebounceState<P>>>,
    /// Held for the whole of every action call.
    running: Arc<AsyncMutex<()>>,
    action: Action<P>,
}

impl<P> Debouncer<P>
where
    P: Send + 'static,
{
    pub fn new<F, Fut>(delay: Duration, action: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            delay,
            state: Arc::new(Mutex::new(DebounceState {
                pending_timer: None,
                latest_payload: None,
                generation: 0,
            })),
            running: Arc::new(AsyncMutex::new(())),
            action: Arc::new(
                move |payload| -> Pin<Box<dyn Future<Output = ()> + Send>> {
                    Box::pin(action(payload))
                },
            ),
        }
    }

    /// Replace the pending payload and restart the quiet period.
    pub fn schedule(&self, payload: P) {
        let mut state = lock(&self.state);
        if let Some(timer) = state.pending_timer.take() {
            timer.abort();
        }
        state.generation += 1;
        state.latest_payload = Some(payload);

        let generation = state.generation;
        let delay = self.delay;
        let shared = Arc::clone(&self.state);
        let running = Arc::clone(&self.running);
        let action = Arc::clone(&self.action);
        state.pending_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Claimed before the payload so a waiter never misses this call.
            let _running = running.lock().await;
            let payload = {
                let mut state = lock(&shared);
                if state.generation != generation {
                    return;
                }
                state.pending_timer = None;
                state.latest_payload.take()
            };
            if let Some(payload) = payload {
                action(payload).await;
            }
        }));
    }

    /// Drop the pending payload without running the action.
    ///
    /// An action call that has already started keeps running; see
    /// [`cancel_and_wait`](Self::cancel_and_wait).
    pub fn cancel(&self) {
        let mut state = lock(&self.state);
        Self::disarm(&mut state);
    }

    /// Drop the pending payload and wait for a started action call to end.
    pub async fn cancel_and_wait(&self) {
        self.cancel();
        drop(self.running.lock().await);
    }

    /// Run the action now with the pending payload, if any, after any
    /// started call has ended.
    pub async fn flush(&self) {
        let payload = {
            let mut state = lock(&self.state);
            Self::disarm(&mut state)
        };
        let _running = self.running.lock().await;
        if let Some(payload) = payload {
            (self.action)(payload).await;
        }
    }

    /// Whether a payload is waiting for its timer.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        lock(&self.state).latest_payload.is_some()
    }

    fn disarm(state: &mut DebounceState<P>) -> Option<P> {
        if let Some(timer) = state.pending_timer.take() {
            timer.abort();
        }
        state.generation += 1;
        state.latest_payload.take()
    }
}

impl<P> Drop for Debouncer<P> {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.state).pending_timer.take() {
            timer.abort();
        }
    }
}

fn lock<P>(state: &Mutex<DebounceState<P>>) -> MutexGuard<'_, DebounceState<P>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
