//! Durable storage backends for the cache layer.
//!
//! A [`Cache`](crate::Cache) can mirror selected entries into a durable
//! store so they survive the in-memory copy. The store is a plain
//! string-to-string surface: implementations only need `get_item`,
//! `set_item` and `remove_item`. [`DiskStore`] keeps one file per key
//! under a cache directory; [`MemoryStore`] backs tests and acts as a
//! process-local fallback.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by a durable store.
///
/// These never escape the cache API: the cache catches them, logs a
/// warning and downgrades itself to memory-only operation.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failure (missing directory, quota, permissions).
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// The store rejected the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Key/value surface for durable storage.
///
/// Values are opaque strings; the cache layer handles serialization.
/// Implementations may fail at any time (disabled storage, quota
/// exceeded) - callers are expected to treat any error as "storage
/// unavailable" rather than fatal.
pub trait DurableStore {
    /// Fetch the stored string for `key`, or `None` if absent.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key` if present. Removing an absent key is not an error.
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory durable store.
///
/// Useful as a test double and for callers that want the persistence
/// code path without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl DurableStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

/// File-backed durable store.
///
/// Stores one file per key under a directory. Keys are hex-encoded to
/// produce safe file names, so arbitrary key strings are accepted.
///
/// # Example
///
/// ```no_run
/// use preview_cache::{DiskStore, DurableStore};
///
/// let mut store = DiskStore::new("/tmp/preview-cache");
/// store.set_item("pv-theme", "\"dark\"").unwrap();
/// assert_eq!(store.get_item("pv-theme").unwrap().as_deref(), Some("\"dark\""));
/// ```
#[derive(Debug, Clone)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    /// Create a store rooted at `dir`.
    ///
    /// The directory is created lazily on the first write, so
    /// construction itself cannot fail.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Create a store under the platform cache directory
    /// (e.g. `~/.cache/<namespace>` on Linux).
    ///
    /// Returns `None` when the platform provides no cache directory.
    pub fn in_cache_dir(namespace: &str) -> Option<Self> {
        dirs::cache_dir().map(|base| Self::new(base.join(namespace)))
    }

    /// Directory this store writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_to_path(&self, key: &str) -> PathBuf {
        // Hex-encode so keys never produce hostile file names.
        let mut name = String::with_capacity(key.len() * 2);
        for byte in key.bytes() {
            use std::fmt::Write as _;
            let _ = write!(name, "{byte:02x}");
        }
        name.push_str(".json");
        self.dir.join(name)
    }
}

impl DurableStore for DiskStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.key_to_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.key_to_path(key), value)?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.key_to_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
