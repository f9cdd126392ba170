use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{BlobMedium, FileMedium, MemoryMedium, StoreError, StoreKey};

/// Typed key/value store over a blob medium.
///
/// Cheap to clone; clones share the same medium.
#[derive(Clone)]
pub struct DocumentStore {
    medium: Arc<dyn BlobMedium>,
}

impl DocumentStore {
    /// Creates a store over an arbitrary medium.
    pub fn new(medium: impl BlobMedium + 'static) -> Self {
        Self {
            medium: Arc::new(medium),
        }
    }

    /// Opens a file-backed store in `data_dir`.
    pub fn open(data_dir: PathBuf) -> Self {
        Self::new(FileMedium::new(data_dir))
    }

    /// Creates an empty in-memory store.
    pub fn in_memory() -> Self {
        Self::new(MemoryMedium::new())
    }

    /// Reads and deserializes the value under `key`.
    ///
    /// Returns `None` if the key is absent. A blob that can't be read or
    /// parsed is also reported as `None`, with a warning logged, so that a
    /// corrupt collection degrades to an empty one.
    pub fn get<T: DeserializeOwned>(&self, key: StoreKey) -> Option<T> {
        let blob = match self.medium.read(key.as_str()) {
            Ok(Some(blob)) => blob,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&blob) {
            Ok(value) => {
                tracing::debug!(key = %key, bytes = blob.len(), "Loaded document");
                Some(value)
            }
            Err(e) => {
                tracing::warn!("Ignoring corrupt document {}: {}", key, e);
                None
            }
        }
    }

    /// Like [`get`](Self::get), falling back to `T::default()`.
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: StoreKey) -> T {
        self.get(key).unwrap_or_default()
    }

    /// Serializes `value` and replaces whatever was stored under `key`.
    pub fn set<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) -> Result<(), StoreError> {
        let blob = serde_json::to_string(value).map_err(|e| StoreError::Serialize(key, e))?;
        self.medium.write(key.as_str(), &blob)?;
        tracing::debug!(key = %key, bytes = blob.len(), "Saved document");
        Ok(())
    }

    /// Removes `key`. Returns `Ok(false)` if it wasn't present.
    pub fn remove(&self, key: StoreKey) -> Result<bool, StoreError> {
        self.medium.delete(key.as_str())
    }

    /// Removes every key owned by the application.
    ///
    /// Returns the number of keys that were present.
    pub fn clear_all(&self) -> Result<usize, StoreError> {
        let mut removed = 0;
        for key in StoreKey::ALL {
            if self.remove(key)? {
                removed += 1;
            }
        }
        tracing::info!("Cleared {} collection(s)", removed);
        Ok(removed)
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore").finish_non_exhaustive()
    }
}
