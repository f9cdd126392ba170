use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::{load_orders, reconcile, OrderSink};
use crate::clock::Clock;
use crate::error::RepoError;
use crate::models::FridgeOrder;
use crate::session::Session;
use crate::store::{DocumentStore, StoreKey};

/// Quiet period after the last reorder before the remote write goes out.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushState {
    Idle,
    /// A reorder is stored locally and the remote write is waiting for its
    /// deadline.
    PendingRemoteFlush,
}

/// Writes reorders locally at once and coalesces the remote writes.
///
/// Time only moves through the injected clock: nothing fires until
/// [`poll`](Self::poll) observes that the deadline has passed. Long-lived
/// hosts drive `poll` with [`spawn_debounce_driver`](super::spawn_debounce_driver);
/// short-lived ones call [`flush_now`](Self::flush_now) before exiting.
/// Dropping a coordinator with a pending write flushes it.
///
/// Pending writes are kept per user, so one session's reorder never replaces
/// another's.
pub struct OrderCoordinator<S: OrderSink> {
    store: DocumentStore,
    clock: Arc<dyn Clock>,
    sink: S,
    window: chrono::Duration,
    pending: BTreeMap<String, Pending>,
}

#[derive(Debug)]
struct Pending {
    order: FridgeOrder,
    deadline: DateTime<Utc>,
}

impl<S: OrderSink> OrderCoordinator<S> {
    pub fn new(store: DocumentStore, clock: Arc<dyn Clock>, sink: S) -> Self {
        Self {
            store,
            clock,
            sink,
            window: to_chrono(DEFAULT_DEBOUNCE),
            pending: BTreeMap::new(),
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = to_chrono(window);
        self
    }

    pub fn state(&self) -> FlushState {
        if self.pending.is_empty() {
            FlushState::Idle
        } else {
            FlushState::PendingRemoteFlush
        }
    }

    /// When the next pending remote write becomes due, if any is armed.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.pending.values().map(|p| p.deadline).min()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The user's stored order reconciled against `present_ids`.
    ///
    /// A reconciled order that differs from the stored one is written back
    /// locally. Loading never arms a remote write.
    pub fn load(&mut self, session: &Session, present_ids: &[String]) -> Result<FridgeOrder, RepoError> {
        let user_id = session.require_user()?;
        let mut orders = load_orders(&self.store);
        let stored = orders.get(user_id).cloned().unwrap_or_default();

        let order = FridgeOrder::new(reconcile(&stored.fridge_ids, present_ids));
        if order != stored {
            orders.insert(user_id.to_string(), order.clone());
            self.store.set(StoreKey::FridgeOrder, &orders)?;
            tracing::debug!(user_id, count = order.fridge_ids.len(), "Reconciled fridge order");
        }
        Ok(order)
    }

    /// Stores `fridge_ids` as the user's order and (re)arms the remote write.
    pub fn reorder(&mut self, session: &Session, fridge_ids: Vec<String>) -> Result<FridgeOrder, RepoError> {
        let user_id = session.require_user()?;
        let order = FridgeOrder::new(reconcile(&fridge_ids, &fridge_ids));

        let mut orders = load_orders(&self.store);
        orders.insert(user_id.to_string(), order.clone());
        self.store.set(StoreKey::FridgeOrder, &orders)?;

        let deadline = self.clock.now() + self.window;
        self.pending.insert(
            user_id.to_string(),
            Pending {
                order: order.clone(),
                deadline,
            },
        );

        tracing::debug!(user_id, %deadline, "Stored fridge order, remote write armed");
        Ok(order)
    }

    /// Sends every order whose deadline has passed. Returns whether
    /// anything was sent.
    pub fn poll(&mut self) -> bool {
        let now = self.clock.now();
        let due: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, p)| now >= p.deadline)
            .map(|(user_id, _)| user_id.clone())
            .collect();

        for user_id in &due {
            if let Some(pending) = self.pending.remove(user_id) {
                self.sink.send(&pending.order);
            }
        }
        !due.is_empty()
    }

    /// Cancels every debounce timer and sends the pending orders through the
    /// sink's final path. Returns whether anything was pending.
    pub fn flush_now(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        for (user_id, pending) in std::mem::take(&mut self.pending) {
            tracing::debug!(
                user_id = %user_id,
                count = pending.order.fridge_ids.len(),
                "Flushing fridge order"
            );
            self.sink.send_final(&pending.order);
        }
        true
    }
}

impl<S: OrderSink> Drop for OrderCoordinator<S> {
    fn drop(&mut self) {
        self.flush_now();
    }
}

fn to_chrono(window: Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(window.as_millis().min(i64::MAX as u128) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::db::test_support::start;
    use crate::ordering::test_support::{Delivery, RecordingSink};

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn setup() -> (DocumentStore, ManualClock, RecordingSink, OrderCoordinator<RecordingSink>) {
        let store = DocumentStore::in_memory();
        let clock = ManualClock::new(start());
        let sink = RecordingSink::default();
        let coordinator = OrderCoordinator::new(store.clone(), Arc::new(clock.clone()), sink.clone());
        (store, clock, sink, coordinator)
    }

    #[test]
    fn test_reorder_writes_locally_at_once() {
        let (store, _clock, sink, mut coordinator) = setup();
        let alice = Session::for_user("alice");

        coordinator.reorder(&alice, ids(&["b", "a"])).unwrap();

        let orders = load_orders(&store);
        assert_eq!(orders["alice"].fridge_ids, ids(&["b", "a"]));
        assert_eq!(coordinator.state(), FlushState::PendingRemoteFlush);
        assert!(sink.deliveries().is_empty());
    }

    #[test]
    fn test_burst_coalesces_into_one_send() {
        let (_store, clock, sink, mut coordinator) = setup();
        let alice = Session::for_user("alice");

        for order in [&["a", "b", "c"], &["b", "a", "c"], &["c", "b", "a"]] {
            coordinator.reorder(&alice, ids(order)).unwrap();
            clock.advance(chrono::Duration::milliseconds(1000));
            assert!(!coordinator.poll());
        }

        clock.advance(chrono::Duration::milliseconds(2000));
        assert!(coordinator.poll());
        assert!(!coordinator.poll());
        assert_eq!(coordinator.state(), FlushState::Idle);

        let deliveries = sink.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].0, Delivery::Debounced);
        assert_eq!(deliveries[0].1.fridge_ids, ids(&["c", "b", "a"]));
    }

    #[test]
    fn test_deadline_resets_on_reorder() {
        let (_store, clock, _sink, mut coordinator) = setup();
        let alice = Session::for_user("alice");

        coordinator.reorder(&alice, ids(&["a"])).unwrap();
        let first = coordinator.deadline().unwrap();
        clock.advance(chrono::Duration::milliseconds(2500));
        coordinator.reorder(&alice, ids(&["a"])).unwrap();

        assert_eq!(
            coordinator.deadline().unwrap() - first,
            chrono::Duration::milliseconds(2500)
        );
    }

    #[test]
    fn test_flush_now_cancels_timer() {
        let (_store, clock, sink, mut coordinator) = setup();
        let alice = Session::for_user("alice");

        coordinator.reorder(&alice, ids(&["a", "b"])).unwrap();
        assert!(coordinator.flush_now());
        assert_eq!(coordinator.state(), FlushState::Idle);

        clock.advance(chrono::Duration::seconds(10));
        assert!(!coordinator.poll());
        assert!(!coordinator.flush_now());

        let deliveries = sink.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].0, Delivery::Final);
    }

    #[test]
    fn test_drop_flushes_pending() {
        let (_store, _clock, sink, mut coordinator) = setup();
        coordinator
            .reorder(&Session::for_user("alice"), ids(&["x"]))
            .unwrap();
        drop(coordinator);

        assert_eq!(sink.deliveries()[0].0, Delivery::Final);
    }

    #[test]
    fn test_drop_when_idle_sends_nothing() {
        let (_store, _clock, sink, coordinator) = setup();
        drop(coordinator);
        assert!(sink.deliveries().is_empty());
    }

    #[test]
    fn test_custom_window() {
        let (_store, clock, sink, coordinator) = setup();
        let mut coordinator = coordinator.with_window(Duration::from_millis(100));
        coordinator
            .reorder(&Session::for_user("alice"), ids(&["a"]))
            .unwrap();

        clock.advance(chrono::Duration::milliseconds(100));
        assert!(coordinator.poll());
        assert_eq!(sink.deliveries().len(), 1);
    }

    #[test]
    fn test_load_reconciles_and_persists() {
        let (store, _clock, sink, mut coordinator) = setup();
        let alice = Session::for_user("alice");
        coordinator.reorder(&alice, ids(&["c", "gone", "a"])).unwrap();
        coordinator.flush_now();

        let order = coordinator.load(&alice, &ids(&["a", "b", "c"])).unwrap();
        assert_eq!(order.fridge_ids, ids(&["c", "a", "b"]));
        assert_eq!(load_orders(&store)["alice"], order);
        assert_eq!(coordinator.state(), FlushState::Idle);
        assert_eq!(sink.deliveries().len(), 1);
    }

    #[test]
    fn test_sessions_keep_separate_pending_writes() {
        let (_store, clock, sink, mut coordinator) = setup();
        let alice = Session::for_user("alice");
        let bob = Session::for_user("bob");

        coordinator.reorder(&alice, ids(&["a2", "a1"])).unwrap();
        clock.advance(chrono::Duration::milliseconds(1000));
        coordinator.reorder(&bob, ids(&["b1", "b2"])).unwrap();

        // Alice's write comes due first and goes out alone.
        clock.advance(chrono::Duration::milliseconds(2000));
        assert!(coordinator.poll());
        assert_eq!(coordinator.state(), FlushState::PendingRemoteFlush);

        clock.advance(chrono::Duration::milliseconds(1000));
        assert!(coordinator.poll());
        assert_eq!(coordinator.state(), FlushState::Idle);

        let sent: Vec<Vec<String>> = sink
            .deliveries()
            .into_iter()
            .map(|(_, order)| order.fridge_ids)
            .collect();
        assert_eq!(sent, vec![ids(&["a2", "a1"]), ids(&["b1", "b2"])]);
    }

    #[test]
    fn test_flush_now_sends_every_user() {
        let (_store, _clock, sink, mut coordinator) = setup();
        coordinator
            .reorder(&Session::for_user("alice"), ids(&["a"]))
            .unwrap();
        coordinator
            .reorder(&Session::for_user("bob"), ids(&["b"]))
            .unwrap();

        assert!(coordinator.flush_now());
        let deliveries = sink.deliveries();
        assert_eq!(deliveries.len(), 2);
        assert!(deliveries.iter().all(|(kind, _)| *kind == Delivery::Final));
    }

    #[test]
    fn test_reorder_requires_session() {
        let (_store, _clock, _sink, mut coordinator) = setup();
        assert!(matches!(
            coordinator.reorder(&Session::anonymous(), ids(&["a"])),
            Err(RepoError::PermissionDenied(_))
        ));
        assert_eq!(coordinator.state(), FlushState::Idle);
    }
}
