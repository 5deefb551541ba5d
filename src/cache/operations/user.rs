use std::sync::Arc;
use std::time::Duration;

use crate::cache::keys::user_keys;
use crate::cache::store::CacheStore;

/// User cache operations
///
/// Every method is best-effort: a backend failure is logged and reported as a
/// miss (reads) or swallowed (writes and deletes). The cache is never allowed
/// to fail a request. Failed deletes are not retried; the stale entry lives
/// until its TTL runs out.
#[derive(Clone)]
pub struct UserCacheOperations {
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl UserCacheOperations {
    pub fn new(cache: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Cached serialized listing of all users
    pub async fn get_listing(&self) -> Option<String> {
        self.read(user_keys::all_users_key()).await
    }

    pub async fn cache_listing(&self, payload: &str) {
        self.write(user_keys::all_users_key(), payload).await;
    }

    /// Cached serialized record of a single user
    pub async fn get_user(&self, id: i32) -> Option<String> {
        self.read(&user_keys::user_key(id)).await
    }

    pub async fn cache_user(&self, id: i32, payload: &str) {
        self.write(&user_keys::user_key(id), payload).await;
    }

    /// Drops the collection key so the next listing read goes to the store.
    pub async fn invalidate_listing(&self) {
        self.remove(user_keys::all_users_key()).await;
    }

    /// Drops the per-user key for `id`. No-op when absent.
    pub async fn invalidate_user(&self, id: i32) {
        self.remove(&user_keys::user_key(id)).await;
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.cache.get(key).await {
            Ok(Some(value)) => {
                tracing::debug!("Cache hit: {}", key);
                Some(value)
            }
            Ok(None) => {
                tracing::debug!("Cache miss: {}", key);
                None
            }
            Err(e) => {
                tracing::warn!("Cache read failed for {}, treating as miss: {}", key, e);
                None
            }
        }
    }

    async fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.cache.set(key, value, self.ttl).await {
            tracing::warn!("Failed to cache {}: {}", key, e);
        }
    }

    async fn remove(&self, key: &str) {
        match self.cache.delete(key).await {
            Ok(()) => tracing::debug!("Invalidated cache key {}", key),
            Err(e) => tracing::warn!("Failed to invalidate {}, entry will expire by TTL: {}", key, e),
        }
    }
}
