pub mod backend;
pub mod dto;
pub mod encode;
pub mod handlers;
pub mod nutrition;
pub mod orchestrator;
pub mod simulate;
pub mod validate;
pub mod vision;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
