//! Bounded cache with FIFO eviction.
//!
//! Wraps a [`Cache`] with an insertion-order tracker and a hard cap on
//! the number of entries. Eviction is FIFO, not LRU: updating an existing
//! key never refreshes its position, so the oldest *inserted* surviving
//! key is always the next to go. Thumbnails are cheap to regenerate and
//! are accessed mostly in scroll order, so insertion order is a good
//! enough proxy and keeps the bookkeeping trivial.

use std::collections::VecDeque;

use tracing::debug;

use crate::Cache;

/// Default entry cap.
pub const DEFAULT_MAX_ENTRIES: usize = 500;

/// A [`Cache`] bounded to a maximum number of entries.
///
/// Once the cap is reached, every insertion of a *new* key evicts the
/// least-recently-inserted surviving key. Only one eviction can occur
/// per [`set`](BoundedCache::set): the tracker grows by at most one key
/// per call, so one eviction restores the invariant.
///
/// # Example
///
/// ```
/// use preview_cache::BoundedCache;
///
/// let mut cache = BoundedCache::with_max_entries(2);
/// cache.set("a", 1);
/// cache.set("b", 2);
/// cache.set("c", 3); // evicts "a"
///
/// assert!(!cache.has("a"));
/// assert_eq!(cache.get("b"), Some(&2));
/// assert_eq!(cache.get("c"), Some(&3));
/// ```
pub struct BoundedCache<V> {
    cache: Cache<V>,
    /// FIFO order tracker: front = least recently inserted.
    order: VecDeque<String>,
    max_entries: usize,
}

impl<V> BoundedCache<V> {
    /// Create a bounded cache with the default cap of
    /// [`DEFAULT_MAX_ENTRIES`].
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// Create a bounded cache holding at most `max_entries` entries.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            cache: Cache::new(),
            order: VecDeque::new(),
            max_entries,
        }
    }

    /// Store `value` under `key`, evicting the oldest inserted key when
    /// the cap is exceeded.
    ///
    /// Re-setting an existing key updates its value in place and does
    /// not change its eviction position.
    pub fn set(&mut self, key: &str, value: V) {
        if !self.order.iter().any(|tracked| tracked == key) {
            self.order.push_back(key.to_string());
        }

        self.cache.set(key, value);

        if self.order.len() > self.max_entries {
            if let Some(oldest) = self.order.pop_front() {
                debug!(key = %oldest, "evicting oldest cache entry");
                self.cache.unset(&oldest);
            }
        }
    }

    /// Fetch the value for `key`.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.cache.peek(key)
    }

    /// Fetch a mutable reference to the value for `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        // The bounded layer never persists, so the in-memory map is the
        // whole story and handing out &mut cannot skew durable state.
        self.cache.get_mut_in_memory(key)
    }

    /// Check whether `key` is present.
    pub fn has(&self, key: &str) -> bool {
        self.cache.peek(key).is_some()
    }

    /// Remove `key` from the store and the order tracker.
    pub fn unset(&mut self, key: &str) {
        self.order.retain(|tracked| tracked != key);
        self.cache.unset(key);
    }

    /// Number of tracked entries.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Maximum number of entries this cache will hold.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Keys in eviction order (oldest first). Primarily for tests and
    /// diagnostics.
    pub fn insertion_order(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Release the store and the order tracker.
    ///
    /// Safe to call more than once; a destroyed cache is simply empty.
    pub fn destroy(&mut self) {
        self.order.clear();
        self.cache.clear_memory();
    }
}

impl<V> Default for BoundedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_set_get() {
        let mut cache = BoundedCache::new();

        cache.set("a", 1);
        assert_eq!(cache.get("a"), Some(&1));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.max_entries(), DEFAULT_MAX_ENTRIES);
    }

    #[test]
    fn test_fifo_eviction_order() {
        let n = 4;
        let mut cache = BoundedCache::with_max_entries(n);

        // Insert n + 1 distinct keys; the first must be the one evicted.
        for i in 0..=n {
            cache.set(&format!("k{i}"), i);
        }

        assert!(!cache.has("k0"));
        for i in 1..=n {
            assert!(cache.has(&format!("k{i}")), "k{i} should survive");
        }

        // Relative order of survivors is preserved.
        let order: Vec<_> = cache.insertion_order().collect();
        assert_eq!(order, vec!["k1", "k2", "k3", "k4"]);
    }

    #[test]
    fn test_update_does_not_refresh_recency() {
        let mut cache = BoundedCache::with_max_entries(2);

        cache.set("k1", 1);
        cache.set("k2", 2);

        // FIFO, not LRU: re-setting k1 must not move it off the head.
        cache.set("k1", 10);
        assert_eq!(cache.get("k1"), Some(&10));

        // Overflow by one: k1 (original head) is evicted, not k2.
        cache.set("k3", 3);
        assert!(!cache.has("k1"));
        assert!(cache.has("k2"));
        assert!(cache.has("k3"));
    }

    #[test]
    fn test_update_existing_key_does_not_grow_tracker() {
        let mut cache = BoundedCache::with_max_entries(3);

        cache.set("a", 1);
        cache.set("a", 2);
        cache.set("a", 3);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some(&3));
    }

    #[test]
    fn test_at_most_one_eviction_per_set() {
        let mut cache = BoundedCache::with_max_entries(3);

        for i in 0..10 {
            cache.set(&format!("k{i}"), i);
            assert!(cache.len() <= 3, "cap violated after insert {i}");
        }

        let order: Vec<_> = cache.insertion_order().collect();
        assert_eq!(order, vec!["k7", "k8", "k9"]);
    }

    #[test]
    fn test_unset_removes_from_tracker() {
        let mut cache = BoundedCache::with_max_entries(2);

        cache.set("a", 1);
        cache.unset("a");
        assert_eq!(cache.len(), 0);
        assert!(!cache.has("a"));

        // The freed slot is reusable without forcing an eviction.
        cache.set("b", 2);
        cache.set("c", 3);
        assert!(cache.has("b"));
        assert!(cache.has("c"));
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut cache = BoundedCache::with_max_entries(2);

        cache.set("a", vec![1]);
        if let Some(value) = cache.get_mut("a") {
            value.push(2);
        }
        assert_eq!(cache.get("a"), Some(&vec![1, 2]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut cache = BoundedCache::with_max_entries(2);

        cache.set("a", 1);
        cache.destroy();
        assert!(cache.is_empty());
        assert!(!cache.has("a"));

        // Second destroy must not panic.
        cache.destroy();

        // A destroyed cache still accepts new entries.
        cache.set("b", 2);
        assert_eq!(cache.get("b"), Some(&2));
    }
}
