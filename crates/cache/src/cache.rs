//! Key/value cache with an optional durable-storage mirror.
//!
//! The in-memory map is authoritative. Entries stored through
//! [`Cache::set_persisted`] are additionally written to the durable store
//! as JSON under a namespaced key, and a later [`Cache::get`] that misses
//! in memory re-populates the in-memory slot from the durable copy
//! (write-through-on-read).
//!
//! Storage availability is probed once, lazily, with a write/delete probe
//! and cached for the instance lifetime. Any storage failure downgrades
//! the instance to memory-only operation; no storage error ever escapes
//! the cache API.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::storage::DurableStore;

/// Prefix applied to durable-store keys so cache entries do not collide
/// with unrelated data sharing the same store.
const KEY_PREFIX: &str = "pv-";

/// Key used for the one-time storage availability probe.
const PROBE_KEY: &str = "pv-__storage_probe__";

/// Key/value store with an optional durable-storage mirror.
///
/// Presence is determined by key existence, not value truthiness:
/// falsy-but-defined values (`0`, `false`, `""`) round-trip correctly.
///
/// # Example
///
/// ```
/// use preview_cache::{Cache, MemoryStore};
///
/// let mut cache = Cache::with_store(Box::new(MemoryStore::new()));
/// cache.set_persisted("count", 0);
/// assert_eq!(cache.get("count"), Some(&0));
/// assert_eq!(cache.get("never-set"), None);
/// ```
pub struct Cache<V> {
    entries: HashMap<String, V>,
    store: Option<Box<dyn DurableStore>>,
    /// Result of the availability probe; `None` until first probed.
    available: Option<bool>,
}

impl<V> Cache<V> {
    /// Create a memory-only cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            store: None,
            available: None,
        }
    }

    /// Create a cache that mirrors persisted entries into `store`.
    pub fn with_store(store: Box<dyn DurableStore>) -> Self {
        Self {
            entries: HashMap::new(),
            store: Some(store),
            available: None,
        }
    }

    /// Store `value` in memory only.
    pub fn set(&mut self, key: &str, value: V) {
        self.entries.insert(key.to_string(), value);
    }

    /// Store `value` in memory and mirror a JSON-serialized copy into
    /// the durable store.
    ///
    /// The durable write silently no-ops when storage is unavailable or
    /// the write fails; the in-memory copy is stored either way.
    pub fn set_persisted(&mut self, key: &str, value: V)
    where
        V: Serialize,
    {
        if self.storage_available() {
            match serde_json::to_string(&value) {
                Ok(json) => {
                    let namespaced = namespaced_key(key);
                    if let Some(store) = self.store.as_mut() {
                        if let Err(err) = store.set_item(&namespaced, &json) {
                            warn!(key, %err, "durable write failed; downgrading to memory-only");
                            self.available = Some(false);
                        }
                    }
                }
                Err(err) => {
                    warn!(key, %err, "value not JSON-serializable; stored in memory only");
                }
            }
        }

        self.entries.insert(key.to_string(), value);
    }

    /// Fetch the value for `key`.
    ///
    /// Looks in memory first. On a miss, a durable copy (if any) is
    /// deserialized, written back into the in-memory slot and returned.
    /// Returns `None` when the key exists nowhere.
    pub fn get(&mut self, key: &str) -> Option<&V>
    where
        V: DeserializeOwned,
    {
        if self.entries.contains_key(key) {
            return self.entries.get(key);
        }

        if self.storage_available() {
            let namespaced = namespaced_key(key);
            let json = match self.store.as_ref()?.get_item(&namespaced) {
                Ok(json) => json,
                Err(err) => {
                    warn!(key, %err, "durable read failed; downgrading to memory-only");
                    self.available = Some(false);
                    None
                }
            };

            if let Some(json) = json {
                match serde_json::from_str::<V>(&json) {
                    Ok(value) => {
                        self.entries.insert(key.to_string(), value);
                        return self.entries.get(key);
                    }
                    Err(err) => {
                        warn!(key, %err, "corrupt durable entry ignored");
                    }
                }
            }
        }

        None
    }

    /// Fetch the in-memory value for `key` without consulting durable
    /// storage or write-through side effects.
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Mutable access to the in-memory value for `key`.
    ///
    /// The durable mirror is not updated; callers that persist entries
    /// should write back through [`Cache::set_persisted`].
    pub fn get_mut_in_memory(&mut self, key: &str) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// Check whether `key` exists in memory or in durable storage.
    pub fn has(&mut self, key: &str) -> bool {
        if self.entries.contains_key(key) {
            return true;
        }

        if self.storage_available() {
            let namespaced = namespaced_key(key);
            if let Some(store) = self.store.as_ref() {
                match store.get_item(&namespaced) {
                    Ok(found) => return found.is_some(),
                    Err(err) => {
                        warn!(key, %err, "durable read failed; downgrading to memory-only");
                        self.available = Some(false);
                    }
                }
            }
        }

        false
    }

    /// Remove `key` from memory and from durable storage if present.
    pub fn unset(&mut self, key: &str) {
        if self.storage_available() {
            let namespaced = namespaced_key(key);
            if let Some(store) = self.store.as_mut() {
                if let Err(err) = store.remove_item(&namespaced) {
                    warn!(key, %err, "durable delete failed; downgrading to memory-only");
                    self.available = Some(false);
                }
            }
        }

        self.entries.remove(key);
    }

    /// Drop every in-memory entry. Durable copies are untouched.
    pub fn clear_memory(&mut self) {
        self.entries.clear();
    }

    /// Number of in-memory entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the in-memory map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Probe durable storage availability once and cache the verdict.
    ///
    /// The probe writes and deletes a sentinel key. A failing probe (quota
    /// exceeded, disabled storage) marks the store unavailable for the
    /// lifetime of this instance rather than raising.
    fn storage_available(&mut self) -> bool {
        let Some(store) = self.store.as_mut() else {
            return false;
        };

        if let Some(available) = self.available {
            return available;
        }

        let probe = store
            .set_item(PROBE_KEY, "probe")
            .and_then(|_| store.remove_item(PROBE_KEY));

        let available = match probe {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "durable storage unavailable; operating memory-only");
                false
            }
        };

        self.available = Some(available);
        available
    }
}

impl<V> Default for Cache<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn namespaced_key(key: &str) -> String {
    format!("{KEY_PREFIX}{key}")
}
