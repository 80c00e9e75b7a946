//! Sharded Store Module
//!
//! Partitions the key space across independently locked LRU shards and
//! routes every operation to the shard owning the key.

use crate::cache::{Shard, StoreStats};
use crate::config::{DEFAULT_SHARD_CAPACITY, DEFAULT_SHARD_COUNT};
use crate::error::Result;

// == Store Options ==
/// Construction options for a [`ShardedStore`].
///
/// Each field is defaulted and independently overridable. Non-positive
/// (zero) values are silently ignored in favor of the defaults, so a
/// caller cannot configure an invalid store.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Number of shards the key space is partitioned into (default: 16)
    pub shard_count: usize,
    /// Maximum number of entries per shard (default: 100)
    pub shard_capacity: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            shard_capacity: DEFAULT_SHARD_CAPACITY,
        }
    }
}

// == Sharded Store ==
/// A thread-safe in-memory cache partitioned into fixed LRU shards.
///
/// The shard vector is fixed at construction; a key always routes to the
/// same shard for the lifetime of the store (no resharding). Shards lock
/// independently, so operations on keys in different shards run in
/// parallel with no coordination.
#[derive(Debug)]
pub struct ShardedStore {
    shards: Vec<Shard>,
}

impl ShardedStore {
    // == Constructor ==
    /// Creates a new store from the given options.
    pub fn new(options: StoreOptions) -> Self {
        let shard_count = if options.shard_count > 0 {
            options.shard_count
        } else {
            DEFAULT_SHARD_COUNT
        };
        let shard_capacity = if options.shard_capacity > 0 {
            options.shard_capacity
        } else {
            DEFAULT_SHARD_CAPACITY
        };

        Self {
            shards: (0..shard_count).map(|_| Shard::new(shard_capacity)).collect(),
        }
    }

    // == Set ==
    /// Inserts or updates a key-value pair in the owning shard.
    pub fn set(&self, key: &str, value: &str) {
        self.shard_for(key).set(key, value);
    }

    // == Get ==
    /// Retrieves a value from the owning shard, promoting its recency.
    ///
    /// # Errors
    /// Returns `CacheError::NotFound` if the key is absent.
    pub fn get(&self, key: &str) -> Result<String> {
        self.shard_for(key).get(key)
    }

    // == Delete ==
    /// Removes a key from the owning shard; a no-op if absent.
    pub fn delete(&self, key: &str) {
        self.shard_for(key).delete(key);
    }

    // == Shard Count ==
    /// Returns the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    // == Length ==
    /// Returns the total number of entries across all shards.
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    /// Returns true when no shard holds any entry.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(Shard::is_empty)
    }

    // == Stats ==
    /// Returns aggregated counter snapshots for every shard.
    pub fn stats(&self) -> StoreStats {
        StoreStats::aggregate(self.shards.iter().map(Shard::stats).collect())
    }

    /// Selects the shard owning a key.
    fn shard_for(&self, key: &str) -> &Shard {
        &self.shards[shard_index(key, self.shards.len())]
    }
}

impl Default for ShardedStore {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}

// == Shard Routing ==
/// Computes the shard index for a key.
///
/// A pure function of the key and the shard count: the same key resolves
/// to the same shard across calls, store instances, and process runs.
pub(crate) fn shard_index(key: &str, shard_count: usize) -> usize {
    fnv1a(key.as_bytes()) as usize % shard_count
}

/// 32-bit FNV-1a hash.
fn fnv1a(data: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    let mut hash = OFFSET_BASIS;
    for byte in data {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
