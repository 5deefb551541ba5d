mod handler;
mod model;

pub use handler::{
    clear_user_cache,
    create_user,
    delete_user,
    get_user,
    list_users,
    update_user,
};
pub use model::{CreateUserRequest, UpdateUserRequest};
