//! Router topic endpoints

use axum::extract::State;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, UpdateTopicsRequest};
use crate::domain::routing::TopicSnapshot;

/// GET /v1/router/topics
pub async fn get_topics(State(state): State<AppState>) -> Json<TopicSnapshot> {
    Json(state.topics.snapshot().as_ref().clone())
}

/// PUT /v1/router/topics
///
/// Runs already in flight keep the snapshot they started with.
pub async fn update_topics(
    State(state): State<AppState>,
    Json(request): Json<UpdateTopicsRequest>,
) -> Result<Json<TopicSnapshot>, ApiError> {
    let snapshot = state
        .topics
        .update(request.topics)
        .map_err(|e| ApiError::from(e).with_field("topics"))?;

    Ok(Json(snapshot.as_ref().clone()))
}
