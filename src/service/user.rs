//! Read-through caching of user records with invalidate-on-write.
//!
//! Reads consult the cache first and populate it from the store on a miss.
//! Writes commit to the store first and only then delete the affected keys:
//! the listing key `all_users` first, then the per-user key `user:{id}`.
//!
//! There is no locking between the two steps. A reader that overlaps a write
//! can put the pre-write value back into the cache just before the write's
//! invalidation runs, or after an invalidation that failed. Such an entry is
//! served until its TTL expires, which bounds the staleness.
//!
//! Lookups of missing ids are never cached, so a user created later under
//! that id is visible immediately.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::cache::{CacheStore, UserCacheOperations};
use crate::database::{StoreError, UserEntity, UserRepository};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("user not found")]
    NotFound,
    /// Constraint violation or any other store failure, with the raw text.
    #[error("{0}")]
    Store(String),
    #[error("failed to serialize user data: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::NotFound,
            other => ServiceError::Store(other.to_string()),
        }
    }
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Cache-consistency controller for users
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    cache: UserCacheOperations,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        cache: Arc<dyn CacheStore>,
        ttl: Duration,
    ) -> Self {
        Self {
            repository,
            cache: UserCacheOperations::new(cache, ttl),
        }
    }

    /// Inserts a user and drops the cached listing.
    ///
    /// No per-user key exists yet for a fresh id, so none is touched.
    pub async fn create(&self, username: &str, email: &str) -> Result<UserEntity, ServiceError> {
        let user = self.repository.insert(username, email).await?;
        tracing::info!("Created user {} ({})", user.id, user.username);

        self.cache.invalidate_listing().await;
        Ok(user)
    }

    /// Serialized listing of every user, served from cache when present.
    pub async fn list(&self) -> Result<String, ServiceError> {
        if let Some(cached) = self.cache.get_listing().await {
            return Ok(cached);
        }

        let users = self.repository.find_all().await?;
        let payload = serde_json::to_string(&users)?;
        self.cache.cache_listing(&payload).await;
        Ok(payload)
    }

    /// Serialized record of one user, served from cache when present.
    pub async fn get(&self, id: i32) -> Result<String, ServiceError> {
        if let Some(cached) = self.cache.get_user(id).await {
            return Ok(cached);
        }

        // Misses are not cached
        let user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        let payload = serde_json::to_string(&user)?;
        self.cache.cache_user(id, &payload).await;
        Ok(payload)
    }

    /// `NotFound` unless the store holds `id`. Never touches the cache.
    pub async fn ensure_exists(&self, id: i32) -> Result<(), ServiceError> {
        match self.repository.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound),
        }
    }

    /// Applies `changes` on top of the stored record, then invalidates the
    /// listing and the user's own key.
    pub async fn update(&self, id: i32, changes: UserChanges) -> Result<UserEntity, ServiceError> {
        let existing = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let username = changes.username.unwrap_or(existing.username);
        let email = changes.email.unwrap_or(existing.email);
        let user = self.repository.update(id, &username, &email).await?;
        tracing::info!("Updated user {}", id);

        self.cache.invalidate_listing().await;
        self.cache.invalidate_user(id).await;
        Ok(user)
    }

    /// Removes the user, then invalidates the listing and the user's own key.
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(ServiceError::NotFound);
        }

        self.repository.delete(id).await?;
        tracing::info!("Deleted user {}", id);

        self.cache.invalidate_listing().await;
        self.cache.invalidate_user(id).await;
        Ok(())
    }

    /// Drops the cached record for `id` whether or not the user exists.
    pub async fn invalidate(&self, id: i32) {
        self.cache.invalidate_user(id).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::{CacheError, InMemoryCache};
    use crate::database::InMemoryUserRepository;

    const TTL: Duration = Duration::from_secs(300);

    /// Records every cache call as `op:key` on top of a working cache.
    #[derive(Default)]
    struct RecordingCache {
        inner: InMemoryCache,
        ops: Mutex<Vec<String>>,
    }

    impl RecordingCache {
        fn record(&self, op: &str, key: &str) {
            self.ops.lock().unwrap().push(format!("{}:{}", op, key));
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.ops.lock().unwrap())
        }

        fn mutations(&self) -> Vec<String> {
            self.take()
                .into_iter()
                .filter(|op| !op.starts_with("get:"))
                .collect()
        }
    }

    #[async_trait]
    impl CacheStore for RecordingCache {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.record("get", key);
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
            self.record("set", key);
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> Result<(), CacheError> {
            self.record("del", key);
            self.inner.delete(key).await
        }
    }

    /// A cache whose backend is down.
    struct UnavailableCache;

    fn backend_down() -> CacheError {
        CacheError::Redis(redis::RedisError::from((
            redis::ErrorKind::IoError,
            "connection refused",
        )))
    }

    #[async_trait]
    impl CacheStore for UnavailableCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(backend_down())
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Err(backend_down())
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(backend_down())
        }
    }

    fn service() -> (UserService, Arc<RecordingCache>) {
        let cache = Arc::new(RecordingCache::default());
        let service = UserService::new(
            Arc::new(InMemoryUserRepository::new()),
            cache.clone(),
            TTL,
        );
        (service, cache)
    }

    #[tokio::test]
    async fn create_invalidates_only_the_listing() {
        let (service, cache) = service();
        let user = service.create("testuser", "test@test.com").await.unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(cache.mutations(), vec!["del:all_users"]);
    }

    #[tokio::test]
    async fn failed_create_leaves_cache_alone() {
        let (service, cache) = service();
        service.create("testuser", "test@test.com").await.unwrap();
        service.list().await.unwrap();
        cache.take();

        let err = service.create("testuser", "x@test.com").await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(ref msg) if msg.contains("unique")));
        assert!(cache.mutations().is_empty());
        assert!(cache.inner.contains("all_users").await);
    }

    #[tokio::test]
    async fn get_populates_then_serves_from_cache() {
        let (service, cache) = service();
        service.create("testuser", "test@test.com").await.unwrap();
        cache.take();

        let first = service.get(1).await.unwrap();
        let second = service.get(1).await.unwrap();

        assert_eq!(first, r#"{"id":1,"username":"testuser","email":"test@test.com"}"#);
        assert_eq!(first, second);
        assert_eq!(cache.take(), vec!["get:user:1", "set:user:1", "get:user:1"]);
    }

    #[tokio::test]
    async fn missing_user_is_never_cached() {
        let (service, cache) = service();

        for _ in 0..3 {
            assert!(matches!(service.get(42).await, Err(ServiceError::NotFound)));
        }
        assert!(cache.mutations().is_empty());

        // A later user under that id is visible at once
        for i in 0..42 {
            service
                .create(&format!("u{}", i), &format!("u{}@test.com", i))
                .await
                .unwrap();
        }
        let payload = service.get(42).await.unwrap();
        assert!(payload.contains(r#""username":"u41""#));
    }

    #[tokio::test]
    async fn update_invalidates_listing_then_user_key() {
        let (service, cache) = service();
        service.create("testuser", "test@test.com").await.unwrap();
        service.list().await.unwrap();
        service.get(1).await.unwrap();
        cache.take();

        let changes = UserChanges {
            username: Some("updated_user".into()),
            email: None,
        };
        let user = service.update(1, changes).await.unwrap();

        assert_eq!(user.username, "updated_user");
        assert_eq!(user.email, "test@test.com");
        assert_eq!(cache.mutations(), vec!["del:all_users", "del:user:1"]);
        assert!(service.get(1).await.unwrap().contains("updated_user"));
        assert!(service.list().await.unwrap().contains("updated_user"));
    }

    #[tokio::test]
    async fn delete_invalidates_listing_then_user_key() {
        let (service, cache) = service();
        service.create("testuser", "test@test.com").await.unwrap();
        service.list().await.unwrap();
        service.get(1).await.unwrap();
        cache.take();

        service.delete(1).await.unwrap();

        assert_eq!(cache.mutations(), vec!["del:all_users", "del:user:1"]);
        assert!(matches!(service.get(1).await, Err(ServiceError::NotFound)));
        assert_eq!(service.list().await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn mutations_on_missing_ids_touch_no_cache_key() {
        let (service, cache) = service();
        service.list().await.unwrap();
        cache.take();

        assert!(matches!(
            service.update(9, UserChanges::default()).await,
            Err(ServiceError::NotFound)
        ));
        assert!(matches!(service.delete(9).await, Err(ServiceError::NotFound)));
        assert!(cache.mutations().is_empty());
        assert!(cache.inner.contains("all_users").await);
    }

    #[tokio::test]
    async fn ensure_exists_reads_store_only() {
        let (service, cache) = service();
        service.create("testuser", "test@test.com").await.unwrap();
        cache.take();

        service.ensure_exists(1).await.unwrap();
        assert!(matches!(service.ensure_exists(2).await, Err(ServiceError::NotFound)));
        assert!(cache.take().is_empty());
    }

    #[tokio::test]
    async fn conflicting_update_leaves_cache_alone() {
        let (service, cache) = service();
        service.create("alice", "alice@test.com").await.unwrap();
        service.create("bob", "bob@test.com").await.unwrap();
        service.get(2).await.unwrap();
        cache.take();

        let changes = UserChanges {
            username: Some("alice".into()),
            email: None,
        };
        assert!(matches!(service.update(2, changes).await, Err(ServiceError::Store(_))));
        assert!(cache.mutations().is_empty());
        assert!(service.get(2).await.unwrap().contains("bob"));
    }

    #[tokio::test]
    async fn invalidate_is_idempotent() {
        let (service, cache) = service();
        service.create("testuser", "test@test.com").await.unwrap();
        service.get(1).await.unwrap();

        service.invalidate(1).await;
        service.invalidate(1).await;
        service.invalidate(77).await;

        assert!(!cache.inner.contains("user:1").await);
        assert!(!cache.inner.contains("user:77").await);
    }

    #[tokio::test]
    async fn cache_outage_degrades_to_store_reads() {
        let service = UserService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(UnavailableCache),
            TTL,
        );

        service.create("testuser", "test@test.com").await.unwrap();
        assert!(service.get(1).await.unwrap().contains("testuser"));
        assert!(service.list().await.unwrap().contains("test@test.com"));

        let changes = UserChanges {
            username: None,
            email: Some("new@test.com".into()),
        };
        service.update(1, changes).await.unwrap();
        assert!(service.get(1).await.unwrap().contains("new@test.com"));

        service.delete(1).await.unwrap();
        service.invalidate(1).await;
        assert!(matches!(service.get(1).await, Err(ServiceError::NotFound)));
    }
}
