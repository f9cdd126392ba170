//! One handle over a store, a clock, and every repository built on them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::db::{
    AccountRepository, FridgeRepository, IngredientRepository, NotificationRepository,
    StatisticsRepository,
};
use crate::ordering::{OrderCoordinator, OrderSink};
use crate::session::SessionStore;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct Household {
    store: DocumentStore,
    clock: Arc<dyn Clock>,
    pub accounts: AccountRepository,
    pub fridges: FridgeRepository,
    pub ingredients: IngredientRepository,
    pub notifications: NotificationRepository,
    pub statistics: StatisticsRepository,
    pub sessions: SessionStore,
}

impl Household {
    pub fn new(store: DocumentStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts: AccountRepository::new(store.clone(), clock.clone()),
            fridges: FridgeRepository::new(store.clone(), clock.clone()),
            ingredients: IngredientRepository::new(store.clone(), clock.clone()),
            notifications: NotificationRepository::new(store.clone(), clock.clone()),
            statistics: StatisticsRepository::new(store.clone(), clock.clone()),
            sessions: SessionStore::new(store.clone()),
            store,
            clock,
        }
    }

    /// File-backed household on the wall clock.
    pub fn open(data_dir: PathBuf) -> Self {
        Self::new(DocumentStore::open(data_dir), Arc::new(SystemClock))
    }

    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(DocumentStore::in_memory(), clock)
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// A coordinator for the fridge-list order, sharing this store and clock.
    pub fn order_coordinator<S: OrderSink>(&self, sink: S, window: Duration) -> OrderCoordinator<S> {
        OrderCoordinator::new(self.store.clone(), self.clock.clone(), sink).with_window(window)
    }
}
