mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
