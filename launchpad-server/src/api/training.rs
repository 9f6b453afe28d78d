//! Training API Handlers
//!
//! Submission of training runs.

use axum::{
    Json,
    extract::{Path, State},
};
use launchpad_core::domain::execution::ExecutionRecord;
use launchpad_core::dto::submission::SubmitTrainingRun;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::{Cancellation, SubmissionRequest};

/// POST /tasks/{id}/execute_workflow
/// Export the task's dataset if needed and start a training run
///
/// The pipeline runs on its own task. If the client goes away the run is
/// cancelled at the next stage boundary.
pub async fn execute_workflow(
    State(state): State<AppState>,
    Path(task_id): Path<u64>,
    Json(req): Json<SubmitTrainingRun>,
) -> ApiResult<Json<ExecutionRecord>> {
    let request = SubmissionRequest::from_dto(task_id, req)?;
    tracing::info!(
        "Submitting training run of {} for task {}",
        request.template_uid,
        task_id
    );

    let cancel = Cancellation::new();
    let guard = cancel.drop_guard();
    let pipeline = state.pipeline.clone();

    let outcome = tokio::spawn(async move { pipeline.run(request, cancel).await })
        .await
        .map_err(|e| ApiError::InternalError(format!("Submission task failed: {}", e)))?;
    guard.disarm();

    Ok(Json(outcome?))
}
