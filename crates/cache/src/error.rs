//! Cache error types.
//!
//! Cache failures never fail a request: reads degrade to misses and writes
//! are swallowed by callers. The error type exists so that degradation sites
//! can log what actually happened.

use thiserror::Error;

/// Distributed cache / metrics store errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("cache operation timed out")]
    Timeout,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;
