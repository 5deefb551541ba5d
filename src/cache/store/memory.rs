use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{CacheError, CacheStore};

struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Process-local cache with per-entry expiry.
///
/// Expired entries are dropped lazily when they are next read.
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a live entry exists under `key`.
    pub async fn contains(&self, key: &str) -> bool {
        let now = Utc::now();
        self.entries
            .read()
            .await
            .get(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
            None => return Ok(None),
        }

        // Expired
        entries.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
