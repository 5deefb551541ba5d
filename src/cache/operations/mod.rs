/// Cache operations
/// Typed, best-effort access to cached payloads

pub mod user;

pub use user::UserCacheOperations;
