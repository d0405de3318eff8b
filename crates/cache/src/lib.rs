//! Preview Cache Library
//!
//! Memoization layer for the preview widget.
//!
//! This crate provides the two cache flavors the preview components rely on:
//!
//! - [`Cache`] - a key/value store with an optional durable-storage mirror.
//!   Persisted entries are JSON-serialized under a namespaced key so the
//!   in-memory copy can be recovered on a later read.
//! - [`BoundedCache`] - a [`Cache`] wrapper that enforces a maximum entry
//!   count with FIFO eviction, bounding memory use when thousands of page
//!   thumbnails flow through it.
//!
//! Durable storage sits behind the [`DurableStore`] trait; [`DiskStore`]
//! is the file-backed implementation. Storage failures never propagate out
//! of the cache API - the instance silently degrades to memory-only.

mod bounded;
mod cache;
mod storage;

pub use bounded::{BoundedCache, DEFAULT_MAX_ENTRIES};
pub use cache::Cache;
pub use storage::{DiskStore, DurableStore, MemoryStore, StorageError};
