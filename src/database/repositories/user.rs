use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::error::StoreError;
use crate::database::models::user::UserEntity;

/// Persistence contract for user records.
///
/// Every mutation is atomic: on error the prior state is left untouched.
/// Uniqueness of `username` and `email` is enforced here, not by callers.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user and returns it with its assigned id.
    async fn insert(&self, username: &str, email: &str) -> Result<UserEntity, StoreError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<UserEntity>, StoreError>;

    /// All users ordered by id.
    async fn find_all(&self) -> Result<Vec<UserEntity>, StoreError>;

    /// Overwrites both fields. `NotFound` when `id` does not exist.
    async fn update(
        &self,
        id: i32,
        username: &str,
        email: &str,
    ) -> Result<UserEntity, StoreError>;

    /// `NotFound` when `id` does not exist.
    async fn delete(&self, id: i32) -> Result<(), StoreError>;
}

/// Postgres-backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, username: &str, email: &str) -> Result<UserEntity, StoreError> {
        tracing::debug!("Creating user: {}", username);

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (username, email)
            VALUES ($1, $2)
            RETURNING id, username, email
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_one(&mut *tx)
        .await;

        // Dropping the transaction without commit rolls it back
        match result {
            Ok(user) => {
                tx.commit().await?;
                Ok(user)
            }
            Err(e) => {
                tracing::error!("Failed to create user {}: {:?}", username, e);
                Err(e.into())
            }
        }
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<UserEntity>, StoreError> {
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, username, email
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("Failed to load user {}: {:?}", id, e))?;

        Ok(user)
    }

    async fn find_all(&self) -> Result<Vec<UserEntity>, StoreError> {
        let users = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, username, email
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("Failed to list users: {:?}", e))?;

        Ok(users)
    }

    async fn update(
        &self,
        id: i32,
        username: &str,
        email: &str,
    ) -> Result<UserEntity, StoreError> {
        let mut tx = self.pool.begin().await?;
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users
            SET username = $2, email = $3
            WHERE id = $1
            RETURNING id, username, email
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .fetch_optional(&mut *tx)
        .await
        .inspect_err(|e| tracing::error!("Failed to update user {}: {:?}", id, e))?
        .ok_or(StoreError::NotFound)?;

        tx.commit().await?;
        Ok(user)
    }

    async fn delete(&self, id: i32) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .inspect_err(|e| tracing::error!("Failed to delete user {}: {:?}", id, e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
