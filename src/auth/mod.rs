use crate::state::AppState;
use axum::Router;

mod claims;
pub mod context;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod providers;
pub mod repo_types;
pub mod services;
pub mod status;

pub use claims::Claims;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
