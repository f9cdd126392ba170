//! Persisted ordering of a user's fridge list.
//!
//! An order is written to the local store the moment it changes, and pushed
//! to a remote endpoint once the user stops reordering for a quiet period.
//! Whatever is still pending when the host shuts down goes out through a
//! final, bounded flush.
//!
//! ```text
//!            reorder                       poll (deadline passed)
//!   Idle ─────────────▶ PendingRemoteFlush ──────────────────────▶ Idle
//!                        │   ▲  reorder                              ▲
//!                        │   └── (re-arms deadline)                  │
//!                        └──────────── flush_now / drop ─────────────┘
//! ```
//!
//! Stored orders live under [`StoreKey::FridgeOrder`] as a map from user id
//! to [`FridgeOrder`].

mod coordinator;
mod driver;
mod reconcile;
mod sink;

pub use coordinator::{FlushState, OrderCoordinator, DEFAULT_DEBOUNCE};
pub use driver::spawn_debounce_driver;
pub use reconcile::reconcile;
pub use sink::{HttpOrderSink, NoopSink, OrderSink, SyncError};

use std::collections::HashMap;

use crate::models::FridgeOrder;
use crate::store::{DocumentStore, StoreError, StoreKey};

pub(crate) type OrdersByUser = HashMap<String, FridgeOrder>;

pub(crate) fn load_orders(store: &DocumentStore) -> OrdersByUser {
    store.get_or_default(StoreKey::FridgeOrder)
}

/// Removes a deleted fridge from every stored order.
pub(crate) fn forget_fridge(store: &DocumentStore, fridge_id: &str) -> Result<(), StoreError> {
    let mut orders = load_orders(store);
    let mut changed = false;
    for order in orders.values_mut() {
        let before = order.fridge_ids.len();
        order.fridge_ids.retain(|id| id != fridge_id);
        changed |= order.fridge_ids.len() != before;
    }
    if changed {
        store.set(StoreKey::FridgeOrder, &orders)?;
    }
    Ok(())
}

pub(crate) fn forget_user(store: &DocumentStore, user_id: &str) -> Result<(), StoreError> {
    let mut orders = load_orders(store);
    if orders.remove(user_id).is_some() {
        store.set(StoreKey::FridgeOrder, &orders)?;
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    fn order(ids: &[&str]) -> FridgeOrder {
        FridgeOrder::new(ids.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_forget_fridge_and_user() {
        let store = DocumentStore::in_memory();
        let mut orders = OrdersByUser::new();
        orders.insert("alice".into(), order(&["f1", "f2"]));
        orders.insert("bob".into(), order(&["f2", "f3"]));
        store.set(StoreKey::FridgeOrder, &orders).unwrap();

        forget_fridge(&store, "f2").unwrap();
        let orders = load_orders(&store);
        assert_eq!(orders["alice"], order(&["f1"]));
        assert_eq!(orders["bob"], order(&["f3"]));

        forget_user(&store, "alice").unwrap();
        assert!(!load_orders(&store).contains_key("alice"));
    }
}
