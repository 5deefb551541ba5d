use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};

use super::{CacheError, CacheStore};

/// Redis-backed cache
#[derive(Clone)]
pub struct RedisCache {
    redis: Arc<RedisClient>,
}

impl RedisCache {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }

    /// Parses the URL; no connection is made until the first command.
    pub fn open(url: &str) -> Result<Self, CacheError> {
        let client = RedisClient::open(url)?;
        Ok(Self::new(Arc::new(client)))
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        // SET EX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value, seconds).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
