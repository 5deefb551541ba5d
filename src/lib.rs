use std::sync::Arc;

use config::Config;
use service::UserService;

pub mod cache;
pub mod common;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod service;

/// Shared handles injected into every request handler.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub config: Config,
}
