//! v1 API endpoints

pub mod ask;
pub mod topics;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/ask", post(ask::ask))
        .route("/ask/batch", post(ask::ask_batch))
        .route(
            "/router/topics",
            get(topics::get_topics).put(topics::update_topics),
        )
}
