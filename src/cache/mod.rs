//! Cache Module
//!
//! Sharded in-memory key-value store with per-shard LRU eviction.

mod lru;
mod shard;
mod stats;
mod store;


// Re-export public types
pub use shard::Shard;
pub use stats::{ShardStats, StoreStats};
pub use store::{ShardedStore, StoreOptions};

pub(crate) use store::shard_index;
