//! Entry store and the public cache handle
//!
//! Provides a `Cache` that owns the entry map, serializes access to it with a
//! reader/writer lock, and owns the lifetime of the reaper task.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::reaper::ReaperHandle;

/// Shared map from key to entry, guarded by a single lock
pub(super) type EntryStore = Arc<RwLock<HashMap<String, CacheEntry>>>;

/// A single cached value
#[derive(Debug, Clone)]
pub(super) struct CacheEntry {
    /// The raw cached bytes
    pub(super) value: Vec<u8>,
    /// When the entry was inserted or last overwritten
    pub(super) created_at: Instant,
}

/// Acquires the store for reading, recovering the map if a holder panicked
pub(super) fn read_entries(
    entries: &RwLock<HashMap<String, CacheEntry>>,
) -> RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
    entries.read().unwrap_or_else(PoisonError::into_inner)
}

/// Acquires the store for writing, recovering the map if a holder panicked
pub(super) fn write_entries(
    entries: &RwLock<HashMap<String, CacheEntry>>,
) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
    entries.write().unwrap_or_else(PoisonError::into_inner)
}

/// Thread-safe key/value cache whose entries expire after a fixed TTL
///
/// The same TTL is both the lifetime of every entry and the period of the
/// reaper sweep. `get` does not look at entry age: an entry is visible until the
/// reaper physically removes it, which happens somewhere between one and two
/// TTLs after insertion.
///
/// The cache is meant to be created once and shared by reference. Call
/// [`Cache::close`] to stop the reaper and wait for it to exit; dropping the
/// cache also stops the reaper, but without waiting.
#[derive(Debug)]
pub struct Cache {
    /// Entries keyed by request URL
    entries: EntryStore,
    /// Entry lifetime and sweep period
    ttl: Duration,
    /// Background sweeper, stopped on close or drop
    reaper: ReaperHandle,
}

impl Cache {
    /// Creates an empty cache and starts its reaper.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// A `ttl` too large for the clock to schedule two sweeps is accepted; its
    /// entries simply never expire.
    ///
    /// # Panics
    /// Panics if `ttl` is zero.
    pub fn new(ttl: Duration) -> Self {
        assert!(!ttl.is_zero(), "cache ttl must be greater than zero");

        let entries: EntryStore = Arc::new(RwLock::new(HashMap::new()));
        let reaper = ReaperHandle::spawn(Arc::clone(&entries), ttl);

        Self {
            entries,
            ttl,
            reaper,
        }
    }

    /// Inserts or overwrites the value for `key`.
    ///
    /// Overwriting resets the entry's age, giving it a full new TTL window.
    pub fn add(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        let entry = CacheEntry {
            value: value.into(),
            created_at: Instant::now(),
        };

        debug!(key = %key, bytes = entry.value.len(), "cache add");
        write_entries(&self.entries).insert(key, entry);
    }

    /// Returns the value stored for `key`, however old it is.
    ///
    /// Returns `None` only when the key was never added or the reaper has
    /// already removed it.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let value = read_entries(&self.entries)
            .get(key)
            .map(|entry| entry.value.clone());

        debug!(key, hit = value.is_some(), "cache get");
        value
    }

    /// The configured entry lifetime, also the reaper's sweep period
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of entries currently held, including expired ones not yet swept
    pub fn len(&self) -> usize {
        read_entries(&self.entries).len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stops the reaper and waits until it has exited.
    pub async fn close(self) {
        self.reaper.shutdown().await;
    }
}
