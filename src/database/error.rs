use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,
    /// Duplicate username or email; carries the backend's message.
    #[error("{0}")]
    ConstraintViolation(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::ConstraintViolation(db.message().to_string())
            }
            other => StoreError::Database(other),
        }
    }
}
