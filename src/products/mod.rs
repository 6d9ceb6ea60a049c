mod dto;
pub mod handlers;
pub mod pg_repo;
pub mod repo;
mod repo_types;
pub mod services;
#[cfg(test)]
pub(crate) mod testing;
pub mod validation;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::product_routes())
}
