//! Blob media backing the document store.
//!
//! A medium is a synchronous key→string store. Two are provided:
//!
//! - [`FileMedium`]: one `<key>.json` file per key in a data directory
//! - [`MemoryMedium`]: an in-process map, for tests and throwaway sessions

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::RwLock;

use super::StoreError;

/// File extension for stored blobs.
const BLOB_EXTENSION: &str = "json";

/// A durable, synchronous key→string store.
pub trait BlobMedium: Send + Sync {
    /// Reads the blob stored under `key`, or `None` if absent.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the blob stored under `key`.
    fn write(&self, key: &str, blob: &str) -> Result<(), StoreError>;

    /// Deletes `key`. Returns `Ok(false)` if it didn't exist.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

/// Filesystem-backed medium.
///
/// Writes go to a temporary file which is then renamed over the target, so a
/// reader never observes a half-written blob.
#[derive(Clone, Debug)]
pub struct FileMedium {
    data_dir: PathBuf,
}

impl FileMedium {
    /// Creates a medium rooted at `data_dir`. The directory is created lazily.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Returns the full path for a key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.{}", key, BLOB_EXTENSION))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!(".{}.{}.tmp", key, BLOB_EXTENSION))
    }
}

impl BlobMedium for FileMedium {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path(key);

        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(path, e)),
        }
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StoreError::Io(self.data_dir.clone(), e))?;

        let temp = self.temp_path(key);
        fs::write(&temp, blob).map_err(|e| StoreError::Io(temp.clone(), e))?;

        let path = self.path(key);
        fs::rename(&temp, &path).map_err(|e| StoreError::Io(path, e))?;

        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path(key);

        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(path, e)),
        }
    }
}

/// In-memory medium. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    blobs: RwLock<HashMap<String, String>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobMedium for MemoryMedium {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let blobs = self.blobs.read().unwrap_or_else(|e| e.into_inner());
        Ok(blobs.get(key).cloned())
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        let mut blobs = self.blobs.write().unwrap_or_else(|e| e.into_inner());
        blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut blobs = self.blobs.write().unwrap_or_else(|e| e.into_inner());
        Ok(blobs.remove(key).is_some())
    }
}
