//! Cache Statistics Module
//!
//! Per-shard operation counters and store-wide aggregation.
//!
//! The store embeds no instrumentation logic of its own; these counters are
//! hook points an external observability layer (or the STATS command) can
//! sample.

use serde::Serialize;

// == Shard Stats ==
/// Operation counters for a single shard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShardStats {
    /// Number of set operations (inserts and updates)
    pub sets: u64,
    /// Number of successful get operations
    pub hits: u64,
    /// Number of get operations on absent keys
    pub misses: u64,
    /// Number of delete operations that removed an entry
    pub deletes: u64,
    /// Number of entries evicted by the LRU policy
    pub evictions: u64,
    /// Current number of entries in the shard
    pub entries: usize,
}

impl ShardStats {
    // == Constructor ==
    /// Creates a new ShardStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Set ==
    /// Increments the set counter.
    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Delete ==
    /// Increments the delete counter.
    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    // == Record Eviction ==
    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}

// == Store Stats ==
/// Aggregated counters across every shard of a store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    /// Total set operations
    pub sets: u64,
    /// Total get hits
    pub hits: u64,
    /// Total get misses
    pub misses: u64,
    /// Total deletes that removed an entry
    pub deletes: u64,
    /// Total LRU evictions
    pub evictions: u64,
    /// Total entries currently held
    pub entries: usize,
    /// Per-shard snapshots, indexed by shard
    pub shards: Vec<ShardStats>,
}

impl StoreStats {
    /// Aggregates a set of per-shard snapshots.
    pub fn aggregate(shards: Vec<ShardStats>) -> Self {
        let mut totals = Self {
            shards: Vec::new(),
            ..Self::default()
        };
        for shard in &shards {
            totals.sets += shard.sets;
            totals.hits += shard.hits;
            totals.misses += shard.misses;
            totals.deletes += shard.deletes;
            totals.evictions += shard.evictions;
            totals.entries += shard.entries;
        }
        totals.shards = shards;
        totals
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no gets have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
