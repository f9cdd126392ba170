//! Typed document storage.
//!
//! Every collection lives under one [`StoreKey`] as a single JSON blob in a
//! [`BlobMedium`]. There are no multi-key transactions; repositories that keep
//! invariants across two keys enforce them themselves.
//!
//! # Storage Layout
//!
//! ```text
//! ~/.local/share/fridgekeep/
//! ├── fridgekeep.accounts.json       # Vec<UserAccount>
//! ├── fridgekeep.fridges.json        # Vec<Fridge>
//! ├── fridgekeep.ingredients.json    # Vec<Ingredient>
//! ├── fridgekeep.notifications.json  # user_id -> Vec<Notification>
//! ├── fridgekeep.settings.json       # AppSettings
//! ├── fridgekeep.statistics.json     # user_id -> UserStatistics
//! └── fridgekeep.fridge_order.json   # user_id -> FridgeOrder
//! ```

mod document_store;
mod key;
mod medium;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use document_store::DocumentStore;
pub use key::StoreKey;
pub use medium::{BlobMedium, FileMedium, MemoryMedium};

/// Errors that can occur during document store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),

    #[error("Failed to serialize {0}: {1}")]
    Serialize(StoreKey, #[source] serde_json::Error),
}
