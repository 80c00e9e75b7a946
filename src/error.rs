//! Error types for the cache server
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
///
/// `get` on an absent key is the only failing operation in the core;
/// every other store operation is total. A `NotFound` is a routine
/// outcome translated by the protocol layer, never an anomaly.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache server.
pub type Result<T> = std::result::Result<T, CacheError>;
