//! Key-value cache backends.
//!
//! The service only needs `get`, `set` with a TTL, and `delete`. There is no
//! atomicity across keys; each call is independent and may interleave with
//! calls from concurrent requests.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

mod memory;
mod redis_cache;

pub use self::memory::InMemoryCache;
pub use self::redis_cache::RedisCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Cache backend trait for pluggable cache implementations.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`, replacing any previous value. The entry
    /// is treated as absent once `ttl` has elapsed.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Removes `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
