//! Remote destinations for fridge orders.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::{Builder, Handle};
use tracing::{debug, warn};

use crate::models::FridgeOrder;

/// Upper bound on the shutdown flush. The host is about to exit, so waiting
/// longer than this buys nothing.
const FINAL_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Sync not configured. Set sync.remote_url in config.")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Accepts a full replacement ordering.
///
/// Delivery is best effort: implementations log failures and never report
/// them to the caller, so the local order stays authoritative.
pub trait OrderSink: Send + Sync {
    /// Fire-and-forget. Must not block the caller on network I/O.
    fn send(&self, order: &FridgeOrder);

    /// Last write before the host goes away. May block for a bounded time;
    /// delivery is attempted but not confirmed.
    fn send_final(&self, order: &FridgeOrder) {
        self.send(order);
    }
}

impl<S: OrderSink + ?Sized> OrderSink for Arc<S> {
    fn send(&self, order: &FridgeOrder) {
        (**self).send(order)
    }

    fn send_final(&self, order: &FridgeOrder) {
        (**self).send_final(order)
    }
}

/// Discards every order. Used when no remote is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl OrderSink for NoopSink {
    fn send(&self, _order: &FridgeOrder) {}
}

/// POSTs `{"fridgeIds": [...]}` to a configured URL.
#[derive(Debug, Clone)]
pub struct HttpOrderSink {
    url: String,
    api_key: Option<String>,
}

impl HttpOrderSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
        }
    }

    /// Builds a sink from an optional configured URL.
    pub fn from_config(url: Option<&str>, api_key: Option<&str>) -> Result<Self, SyncError> {
        let url = url.filter(|u| !u.trim().is_empty()).ok_or(SyncError::NotConfigured)?;
        let sink = Self::new(url);
        Ok(match api_key {
            Some(key) => sink.with_api_key(key),
            None => sink,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(url: String, api_key: Option<String>, order: FridgeOrder) -> Result<(), SyncError> {
        let client = reqwest::Client::new();
        let mut request = client.post(&url).json(&order);
        if let Some(key) = api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(SyncError::Status(response.status()));
        }
        debug!(url = %url, count = order.fridge_ids.len(), "Pushed fridge order");
        Ok(())
    }
}

impl OrderSink for HttpOrderSink {
    fn send(&self, order: &FridgeOrder) {
        let post = Self::post(self.url.clone(), self.api_key.clone(), order.clone());
        let task = async move {
            if let Err(e) = post.await {
                warn!(error = %e, "Remote order sync failed");
            }
        };

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(_) => {
                thread::spawn(move || match current_thread_runtime() {
                    Ok(rt) => rt.block_on(task),
                    Err(e) => warn!(error = %e, "Remote order sync failed"),
                });
            }
        }
    }

    fn send_final(&self, order: &FridgeOrder) {
        let post = Self::post(self.url.clone(), self.api_key.clone(), order.clone());

        // A dedicated thread works whether or not the caller is already
        // inside a runtime, and lets us block until the attempt is over.
        let worker = thread::spawn(move || -> Result<(), SyncError> {
            let rt = current_thread_runtime()?;
            rt.block_on(async {
                match tokio::time::timeout(FINAL_TIMEOUT, post).await {
                    Ok(result) => result,
                    Err(_) => Err(SyncError::Timeout(FINAL_TIMEOUT)),
                }
            })
        });

        match worker.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Final order flush failed"),
            Err(_) => warn!("Final order flush thread panicked"),
        }
    }
}

fn current_thread_runtime() -> Result<tokio::runtime::Runtime, SyncError> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(SyncError::Runtime)
}
