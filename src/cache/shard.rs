//! Shard Module
//!
//! A single lock-protected partition of the key space with LRU eviction.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::cache::lru::LruList;
use crate::cache::ShardStats;
use crate::error::{CacheError, Result};

// == Shard ==
/// An independently locked, capacity-bounded LRU partition of the cache.
///
/// The shard pairs a key -> slot index with an [`LruList`] ordered by
/// recency of access, so every operation is O(1) amortized. A capacity of
/// 0 means the shard never evicts.
///
/// One mutex covers all three operations: a `get` promotes the entry to
/// most recently used, so it mutates the recency order and cannot take a
/// read lock. Critical sections never block, which keeps the exclusive
/// lock cheap.
#[derive(Debug)]
pub struct Shard {
    inner: Mutex<ShardInner>,
    capacity: usize,
}

#[derive(Debug)]
struct ShardInner {
    /// Key -> slot in the recency list; always consistent with `order`
    index: HashMap<String, usize>,
    /// Entries ordered most-recently-used first
    order: LruList,
    /// Operation counters sampled by the store
    stats: ShardStats,
}

impl Shard {
    // == Constructor ==
    /// Creates a new empty shard.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries; 0 means unbounded
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(ShardInner {
                index: HashMap::new(),
                order: LruList::new(),
                stats: ShardStats::new(),
            }),
            capacity,
        }
    }

    // == Set ==
    /// Inserts or updates a key-value pair.
    ///
    /// An existing key is updated in place and promoted to most recently
    /// used; updates never trigger eviction. A new key evicts the least
    /// recently used entry first when the shard is at capacity.
    pub fn set(&self, key: &str, value: &str) {
        let inner = &mut *self.inner.lock();
        inner.stats.record_set();

        if let Some(&slot) = inner.index.get(key) {
            inner.order.set_value(slot, value.to_string());
            inner.order.move_to_front(slot);
            return;
        }

        // Capacity check strictly before insertion of a new key
        if self.capacity > 0 && inner.order.len() >= self.capacity {
            inner.evict();
        }

        let slot = inner.order.push_front(key.to_string(), value.to_string());
        inner.index.insert(key.to_string(), slot);
    }

    // == Get ==
    /// Retrieves a value and promotes the key to most recently used.
    ///
    /// # Errors
    /// Returns `CacheError::NotFound` if the key is absent.
    pub fn get(&self, key: &str) -> Result<String> {
        let inner = &mut *self.inner.lock();

        match inner.index.get(key) {
            Some(&slot) => {
                inner.order.move_to_front(slot);
                inner.stats.record_hit();
                Ok(inner.order.value(slot).to_string())
            }
            None => {
                inner.stats.record_miss();
                Err(CacheError::NotFound(key.to_string()))
            }
        }
    }

    // == Delete ==
    /// Removes a key if present; a no-op (not an error) if absent.
    pub fn delete(&self, key: &str) {
        let inner = &mut *self.inner.lock();

        if let Some(slot) = inner.index.remove(key) {
            inner.order.remove(slot);
            inner.stats.record_delete();
        }
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    /// Returns true when the shard holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().order.is_empty()
    }

    // == Stats ==
    /// Returns a snapshot of the shard's operation counters.
    pub fn stats(&self) -> ShardStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.entries = inner.order.len();
        stats
    }
}

impl ShardInner {
    /// Removes the current least recently used entry; a no-op when empty.
    fn evict(&mut self) {
        if let Some((evicted_key, _)) = self.order.pop_back() {
            self.index.remove(&evicted_key);
            self.stats.record_eviction();
        }
    }
}
