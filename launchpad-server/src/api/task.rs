//! Task API Handlers
//!
//! Read-only endpoints over annotation tasks.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use launchpad_core::dto::task::{DumpFormatList, GeneratedPath, ObjectCounts, OutputPathQuery};

use crate::api::AppState;
use crate::api::error::ApiResult;

/// GET /dump_formats
/// List dataset export formats
pub async fn list_dump_formats(State(state): State<AppState>) -> ApiResult<Json<DumpFormatList>> {
    tracing::debug!("Listing dump formats");

    let dump_formats = state.tasks.dump_formats().await?;
    Ok(Json(DumpFormatList { dump_formats }))
}

/// GET /tasks/{id}/object_counts
/// Per-label object counts of a task
pub async fn get_object_counts(
    State(state): State<AppState>,
    Path(task_id): Path<u64>,
) -> ApiResult<Json<ObjectCounts>> {
    tracing::debug!("Counting objects of task {}", task_id);

    let counts = state.tasks.object_counts(task_id).await?;
    Ok(Json(ObjectCounts { task_id, counts }))
}

/// GET /tasks/{id}/output_path?uid=
/// Preview of the output path a run would use
pub async fn get_output_path(
    State(state): State<AppState>,
    Path(task_id): Path<u64>,
    Query(query): Query<OutputPathQuery>,
) -> ApiResult<Json<GeneratedPath>> {
    let name = state.tasks.output_path(task_id, &query.uid).await?;
    Ok(Json(GeneratedPath { name }))
}

/// GET /tasks/{id}/annotation_path
/// Preview of the path the dataset would be uploaded to
pub async fn get_annotation_path(
    State(state): State<AppState>,
    Path(task_id): Path<u64>,
) -> ApiResult<Json<GeneratedPath>> {
    let name = state.tasks.annotation_path(task_id).await?;
    Ok(Json(GeneratedPath { name }))
}
