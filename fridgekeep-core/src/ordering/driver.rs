use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::{OrderCoordinator, OrderSink};

/// Polls a shared coordinator every `tick` on the current tokio runtime.
///
/// The task holds only a weak reference and ends once the host drops the
/// coordinator. Must be called from within a runtime.
pub fn spawn_debounce_driver<S>(
    coordinator: &Arc<Mutex<OrderCoordinator<S>>>,
    tick: Duration,
) -> JoinHandle<()>
where
    S: OrderSink + 'static,
{
    let weak: Weak<Mutex<OrderCoordinator<S>>> = Arc::downgrade(coordinator);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        loop {
            interval.tick().await;
            let Some(coordinator) = weak.upgrade() else {
                tracing::debug!("Order coordinator dropped, stopping debounce driver");
                break;
            };
            let mut guard = coordinator.lock().unwrap_or_else(|e| e.into_inner());
            guard.poll();
        }
    })
}
