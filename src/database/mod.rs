// Database module
// User entity, the repository contract and its postgres / in-memory implementations

pub mod error;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod schema;

pub use error::StoreError;
pub use memory::InMemoryUserRepository;
pub use models::user::UserEntity;
pub use repositories::user::{PgUserRepository, UserRepository};
