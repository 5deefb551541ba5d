/// Collection key holding the serialized listing of every user.
pub const ALL_USERS_KEY: &str = "all_users";

/// Per-user key prefix
const USER_PREFIX: &str = "user:";

/// Key for the full user listing.
pub fn all_users_key() -> &'static str {
    ALL_USERS_KEY
}

/// Key for one user's serialized record, `user:{id}`.
///
/// Both the read path that populates the entry and the write paths that
/// invalidate it go through this function, so they always agree.
pub fn user_key(id: i32) -> String {
    format!("{}{}", USER_PREFIX, id)
}
