use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::{AppState, middleware::log_errors};

pub mod index;
pub mod user;

/// Builds the application router with state attached.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index::index))
        .route("/users", post(user::create_user).get(user::list_users))
        .route(
            "/users/{id}",
            get(user::get_user)
                .put(user::update_user)
                .delete(user::delete_user),
        )
        .route("/users/{id}/cache", delete(user::clear_user_cache))
        .layer(axum::middleware::from_fn(log_errors))
        .with_state(state)
}
