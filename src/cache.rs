//! TTL Key/Value Cache
//!
//! In-process cache with per-instance TTL and lazy eviction on read.
//! All operations serialize on a single mutex, coarse-grained on purpose:
//! entries are small and every operation is O(1), so contention is not a
//! concern at this scale. Contents are lost on restart; the cache is a
//! performance hint, never a source of truth.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// One cached value plus its insertion time
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Thread-safe TTL cache
pub struct Cache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create a cache whose entries expire `ttl` after insertion
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Get a value, treating entries older than the TTL as absent.
    /// Expired entries are evicted here rather than by a background task.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() <= self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert or replace a value, resetting its TTL clock
    pub fn set(&self, key: K, value: V) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop all entries
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    /// Number of entries currently stored, including not-yet-evicted
    /// expired ones
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
