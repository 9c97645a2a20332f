use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;

pub use extractors::CurrentUser;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
