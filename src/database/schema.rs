use sqlx::PgPool;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id SERIAL PRIMARY KEY,
    username VARCHAR(80) UNIQUE NOT NULL,
    email VARCHAR(120) UNIQUE NOT NULL
)
"#;

/// Creates the `users` table when it does not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_USERS_TABLE).execute(pool).await?;
    tracing::info!("Database schema ready");
    Ok(())
}
