/// Cache key module
/// Every cache key the service reads or deletes is built here

pub mod user_keys;

pub use user_keys::{ALL_USERS_KEY, all_users_key, user_key};
