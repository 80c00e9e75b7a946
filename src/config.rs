//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

// == Defaults ==
/// Default number of shards in the store
pub const DEFAULT_SHARD_COUNT: usize = 16;

/// Default capacity of each shard
pub const DEFAULT_SHARD_CAPACITY: usize = 100;

/// Default number of workers in the dispatch pool
pub const DEFAULT_WORKER_COUNT: usize = 10;

/// Default TCP server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults. Non-positive or unparseable values are silently ignored in
/// favor of the defaults, so a running server never holds an invalid
/// configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of shards the key space is partitioned into
    pub shard_count: usize,
    /// Maximum number of entries each shard can hold
    pub shard_capacity: usize,
    /// Number of workers draining the connection queue
    pub worker_count: usize,
    /// TCP server port
    pub server_port: u16,
    /// Password for the AUTH command; None disables authentication
    pub auth_password: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SHARD_COUNT` - Number of shards (default: 16)
    /// - `SHARD_CAPACITY` - Entries per shard (default: 100)
    /// - `WORKER_COUNT` - Worker pool size (default: 10)
    /// - `SERVER_PORT` - TCP server port (default: 8080)
    /// - `AUTH_PASSWORD` - Enables authentication when set and non-empty
    pub fn from_env() -> Self {
        Self {
            shard_count: env_positive("SHARD_COUNT", DEFAULT_SHARD_COUNT),
            shard_capacity: env_positive("SHARD_CAPACITY", DEFAULT_SHARD_CAPACITY),
            worker_count: env_positive("WORKER_COUNT", DEFAULT_WORKER_COUNT),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            auth_password: env::var("AUTH_PASSWORD").ok().filter(|p| !p.is_empty()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            shard_capacity: DEFAULT_SHARD_CAPACITY,
            worker_count: DEFAULT_WORKER_COUNT,
            server_port: DEFAULT_SERVER_PORT,
            auth_password: None,
        }
    }
}

/// Reads a positive integer from the environment, falling back to a default.
///
/// Values that fail to parse or are not strictly positive are ignored.
fn env_positive(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .map(|v| v as usize)
        .unwrap_or(default)
}
