use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/meals/analyze", post(handlers::analyze))
        .route("/meals/all", get(handlers::list))
        .route(
            "/meals/:id",
            put(handlers::update).delete(handlers::delete),
        )
}
