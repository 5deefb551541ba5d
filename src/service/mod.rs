// Service layer
// Coordinates the user store and the cache

pub mod user;

pub use user::{ServiceError, UserChanges, UserService};
