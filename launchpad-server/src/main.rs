use std::sync::Arc;

use anyhow::Context;
use launchpad_client::{AnnotationClient, ExportPolling, OnepanelClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::repository::{HttpDatasetExporter, S3ObjectStorage};
use crate::service::{
    ArtifactUploader, CatalogService, CheckpointService, ParameterResolver, PathGenerator,
    PipelineServices, PipelineSettings, SubmissionPipeline, SystemClock, TaskService,
    UploadSettings, WorkflowSubmitter,
};

pub mod api;
pub mod config;
pub mod repository;
pub mod service;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "launchpad_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Launchpad server...");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    tracing::info!(
        "Namespace: {}, bucket: {}, catalog: {}, annotation store: {}",
        config.namespace,
        config.s3_bucket,
        config.onepanel_url,
        config.cvat_url
    );

    let state = build_state(&config)?;
    let app = api::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Wires clients, repositories and services together
fn build_state(config: &Config) -> anyhow::Result<api::AppState> {
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let mut onepanel = OnepanelClient::with_client(&config.onepanel_url, http.clone());
    if let Some(token) = &config.onepanel_token {
        onepanel = onepanel.with_token(token);
    }
    let onepanel = Arc::new(onepanel);

    let mut cvat = AnnotationClient::with_client(&config.cvat_url, http);
    if let Some(token) = &config.cvat_token {
        cvat = cvat.with_token(token);
    }
    let polling = ExportPolling {
        interval: config.export_poll_interval,
        max_polls: config.export_max_polls,
    };

    let annotations = Arc::new(cvat.clone());
    let exporter = Arc::new(HttpDatasetExporter::new(cvat, polling));
    let storage = Arc::new(S3ObjectStorage::new(
        config.s3_endpoint_url(),
        config.s3_region.clone(),
    ));

    let paths = Arc::new(PathGenerator::new(
        config.dataset_prefix.clone(),
        config.sync_dir.clone(),
        config.model_dir.clone(),
        Arc::new(SystemClock),
    ));

    let uploader = Arc::new(ArtifactUploader::new(
        storage.clone(),
        UploadSettings {
            concurrency: config.upload_concurrency,
            multipart_threshold: config.multipart_threshold,
            part_size: config.multipart_part_size,
        },
    ));

    let pipeline = SubmissionPipeline::new(
        PipelineServices {
            annotations: annotations.clone(),
            catalog: onepanel.clone(),
            exporter: exporter.clone(),
            uploader,
            submitter: Arc::new(WorkflowSubmitter::new(
                onepanel.clone(),
                config.namespace.clone(),
            )),
            paths: paths.clone(),
            resolver: Arc::new(ParameterResolver::new(config.class_offsets.clone())),
        },
        PipelineSettings {
            namespace: config.namespace.clone(),
            bucket: config.s3_bucket.clone(),
            workspace_uid: config.workspace_uid.clone(),
            scratch_dir: config.scratch_dir.clone(),
            default_dump_format: config.default_dump_format.clone(),
            checkpoint_parameter: config.checkpoint_parameter.clone(),
        },
    );

    Ok(api::AppState {
        catalog: Arc::new(CatalogService::new(
            onepanel,
            config.namespace.clone(),
            Some(config.workflows_label.clone()),
        )),
        tasks: Arc::new(TaskService::new(annotations, exporter, paths.clone())),
        checkpoints: Arc::new(CheckpointService::new(
            storage,
            paths,
            config.namespace.clone(),
            config.s3_bucket.clone(),
        )),
        pipeline,
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
