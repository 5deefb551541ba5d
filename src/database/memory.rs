use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::error::StoreError;
use crate::database::models::user::UserEntity;
use crate::database::repositories::user::UserRepository;

struct MemoryState {
    users: BTreeMap<i32, UserEntity>,
    next_id: i32,
}

/// In-process user repository.
///
/// Ids start at 1 and are never reused, like a `SERIAL` column. Each
/// mutation runs under one write lock, so it is atomic with respect to
/// other calls.
pub struct InMemoryUserRepository {
    state: RwLock<MemoryState>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                users: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryState {
    /// Rejects `username`/`email` when another user (not `except`) holds it.
    fn check_unique(
        &self,
        username: &str,
        email: &str,
        except: Option<i32>,
    ) -> Result<(), StoreError> {
        for user in self.users.values().filter(|u| Some(u.id) != except) {
            if user.username == username {
                return Err(StoreError::ConstraintViolation(format!(
                    "duplicate key value violates unique constraint \"users_username_key\": Key (username)=({}) already exists.",
                    username
                )));
            }
            if user.email == email {
                return Err(StoreError::ConstraintViolation(format!(
                    "duplicate key value violates unique constraint \"users_email_key\": Key (email)=({}) already exists.",
                    email
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, username: &str, email: &str) -> Result<UserEntity, StoreError> {
        let mut state = self.state.write().await;
        state.check_unique(username, email, None)?;

        let user = UserEntity {
            id: state.next_id,
            username: username.to_string(),
            email: email.to_string(),
        };
        state.next_id += 1;
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<UserEntity>, StoreError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<UserEntity>, StoreError> {
        Ok(self.state.read().await.users.values().cloned().collect())
    }

    async fn update(
        &self,
        id: i32,
        username: &str,
        email: &str,
    ) -> Result<UserEntity, StoreError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        state.check_unique(username, email, Some(id))?;

        let user = UserEntity {
            id,
            username: username.to_string(),
            email: email.to_string(),
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: i32) -> Result<(), StoreError> {
        match self.state.write().await.users.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_are_assigned_sequentially_and_not_reused() {
        let repo = InMemoryUserRepository::new();
        let first = repo.insert("alice", "alice@example.com").await.unwrap();
        let second = repo.insert("bob", "bob@example.com").await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        repo.delete(2).await.unwrap();
        let third = repo.insert("carol", "carol@example.com").await.unwrap();
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn duplicate_username_or_email_is_rejected_without_side_effects() {
        let repo = InMemoryUserRepository::new();
        repo.insert("testuser", "test@test.com").await.unwrap();

        let err = repo.insert("testuser", "other@test.com").await.unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(ref msg) if msg.contains("username")));

        let err = repo.insert("other", "test@test.com").await.unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(ref msg) if msg.contains("email")));

        let users = repo.find_all().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "testuser");
    }

    #[tokio::test]
    async fn conflicting_update_leaves_record_unchanged() {
        let repo = InMemoryUserRepository::new();
        repo.insert("alice", "alice@example.com").await.unwrap();
        repo.insert("bob", "bob@example.com").await.unwrap();

        let err = repo.update(2, "alice", "bob@example.com").await.unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));

        let bob = repo.find_by_id(2).await.unwrap().unwrap();
        assert_eq!(bob.username, "bob");
    }

    #[tokio::test]
    async fn update_may_keep_own_values() {
        let repo = InMemoryUserRepository::new();
        repo.insert("alice", "alice@example.com").await.unwrap();

        let user = repo.update(1, "alice", "alice@new.com").await.unwrap();
        assert_eq!(user.email, "alice@new.com");
    }

    #[tokio::test]
    async fn missing_ids_report_not_found() {
        let repo = InMemoryUserRepository::new();
        assert!(repo.find_by_id(7).await.unwrap().is_none());
        assert!(matches!(repo.update(7, "a", "b").await, Err(StoreError::NotFound)));
        assert!(matches!(repo.delete(7).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn listing_is_ordered_by_id() {
        let repo = InMemoryUserRepository::new();
        for name in ["c", "a", "b"] {
            repo.insert(name, &format!("{}@example.com", name)).await.unwrap();
        }
        let ids: Vec<i32> = repo.find_all().await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
