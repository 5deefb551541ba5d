use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User database entity. Also the wire shape of `GET /users` items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserEntity {
    pub id: i32,
    pub username: String,
    pub email: String,
}
