//! Catalog API Handlers
//!
//! Read-through endpoints for workflow templates, the node pool and
//! fine-tuning checkpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use launchpad_core::dto::catalog::{
    CheckpointKeys, CheckpointQuery, NodePoolResponse, TemplateList, TemplateListQuery,
    TemplateParameters,
};

use crate::api::AppState;
use crate::api::error::ApiResult;

/// GET /workflow_templates
/// List workflow templates available to annotators
///
/// Query parameters:
/// - `page` (optional, default 1)
/// - `page_size` (optional, default 100)
pub async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<TemplateListQuery>,
) -> ApiResult<Json<TemplateList>> {
    tracing::debug!("Listing workflow templates");

    let list = state
        .catalog
        .list_templates(query.page, query.page_size)
        .await?;

    Ok(Json(list))
}

/// GET /workflow_templates/{uid}/versions/{version}
/// Public parameters of a template version, with defaults
pub async fn get_template_parameters(
    State(state): State<AppState>,
    Path((uid, version)): Path<(String, String)>,
) -> ApiResult<Json<TemplateParameters>> {
    tracing::debug!("Getting parameters of {} (version {})", uid, version);

    let parameters = state
        .catalog
        .public_parameters(&uid, Some(&version))
        .await?;

    Ok(Json(TemplateParameters { parameters }))
}

/// GET /node_pool
pub async fn get_node_pool(State(state): State<AppState>) -> ApiResult<Json<NodePoolResponse>> {
    tracing::debug!("Getting node pool");

    let node_pool = state.catalog.node_pool().await?;
    Ok(Json(NodePoolResponse { node_pool }))
}

/// GET /checkpoints
/// List earlier model outputs of a template
///
/// Query parameters:
/// - `uid`: template uid
/// - `sys_ref_model` (optional): only keys containing this reference model
pub async fn list_checkpoints(
    State(state): State<AppState>,
    Query(query): Query<CheckpointQuery>,
) -> Json<CheckpointKeys> {
    tracing::debug!("Listing checkpoints of {}", query.uid);

    let keys = state
        .checkpoints
        .list(&query.uid, query.sys_ref_model.as_deref())
        .await;

    Json(CheckpointKeys { keys })
}
