// Cache layer
// Key derivation, pluggable key-value backends and the user payload operations

pub mod keys;
pub mod operations;
pub mod store;

pub use operations::user::UserCacheOperations;
pub use store::{CacheError, CacheStore, InMemoryCache, RedisCache};
