use axum::{routing::post, Router};

use crate::state::AppState;

pub mod calculator;
pub mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/maintenance",
        post(handlers::save).get(handlers::get),
    )
}
