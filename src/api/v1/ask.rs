//! Question answering endpoints

use axum::extract::State;
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{ApiError, AskRequest, BatchAskRequest, BatchAskResponse, Json};
use crate::domain::engine::RunResult;
use crate::domain::Question;
use crate::infrastructure::engine::BatchReport;

/// Upper bound on questions per batch request
pub const MAX_BATCH_QUESTIONS: usize = 100;

/// POST /v1/ask
///
/// Engine failures are part of the returned [`RunResult`]; only a malformed
/// request is an HTTP error.
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<RunResult>, ApiError> {
    let question = Question::new(request.question)
        .map_err(|e| ApiError::from(e).with_field("question"))?;

    let result = state.engine.run(question, state.shutdown.child_token()).await;

    info!(
        run_id = %result.run_id,
        outcome = %result.outcome.as_str(),
        attempts = result.attempts,
        duration_ms = result.duration_ms,
        "Answered question"
    );

    Ok(Json(result))
}

/// POST /v1/ask/batch
pub async fn ask_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchAskRequest>,
) -> Result<Json<BatchAskResponse>, ApiError> {
    if request.questions.is_empty() {
        return Err(ApiError::bad_request("Questions cannot be empty").with_field("questions"));
    }

    if request.questions.len() > MAX_BATCH_QUESTIONS {
        return Err(ApiError::bad_request(format!(
            "At most {} questions per batch",
            MAX_BATCH_QUESTIONS
        ))
        .with_field("questions"));
    }

    let runner = match request.concurrency {
        Some(0) => {
            return Err(ApiError::bad_request("Concurrency must be positive")
                .with_field("concurrency"))
        }
        Some(concurrency) => state.batch.clone().with_concurrency(concurrency),
        None => state.batch.clone(),
    };

    let results = runner
        .run(request.questions.as_slice(), state.shutdown.child_token())
        .await;
    let report = BatchReport::from_results(&results);

    Ok(Json(BatchAskResponse { results, report }))
}
