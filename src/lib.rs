//! Shardcache - A sharded in-memory key-value cache server
//!
//! Partitions keys across independently locked LRU shards and serves a
//! line-oriented command protocol through a bounded worker pool.

pub mod cache;
pub mod config;
pub mod error;
pub mod server;

pub use cache::{ShardedStore, StoreOptions};
pub use config::Config;
pub use error::{CacheError, Result};
pub use server::{serve, spawn_dispatcher, Dispatcher, ServerState};
