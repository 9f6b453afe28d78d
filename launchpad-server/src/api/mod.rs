//! API Module
//!
//! HTTP API layer of the submission service.
//! Each submodule handles endpoints for a specific domain.

pub mod catalog;
pub mod error;
pub mod health;
pub mod task;
pub mod training;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::service::{CatalogService, CheckpointService, SubmissionPipeline, TaskService};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub tasks: Arc<TaskService>,
    pub checkpoints: Arc<CheckpointService>,
    pub pipeline: SubmissionPipeline,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Catalog endpoints
        .route("/workflow_templates", get(catalog::list_templates))
        .route(
            "/workflow_templates/{uid}/versions/{version}",
            get(catalog::get_template_parameters),
        )
        .route("/node_pool", get(catalog::get_node_pool))
        .route("/checkpoints", get(catalog::list_checkpoints))
        // Task endpoints
        .route("/dump_formats", get(task::list_dump_formats))
        .route("/tasks/{id}/object_counts", get(task::get_object_counts))
        .route("/tasks/{id}/output_path", get(task::get_output_path))
        .route("/tasks/{id}/annotation_path", get(task::get_annotation_path))
        // Training endpoints
        .route("/tasks/{id}/execute_workflow", post(training::execute_workflow))
        // Add state and middleware
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
