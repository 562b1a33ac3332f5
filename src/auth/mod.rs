use crate::state::AppState;
use axum::Router;

pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
mod repo_types;
mod validate;

pub use repo_types::{Role, User};

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
