//! Submission pipeline
//!
//! Turns one submit-training-run request into one remote execution:
//!
//! ```text
//! ResolvingParameters -> [CheckingPrerequisite] -> [Exporting -> Uploading] -> Submitting
//! ```
//!
//! Any stage may fail, which ends the run as `Failed(stage, reason)` without
//! touching later stages. Exporting and uploading only happen when the
//! template declares the annotation path parameter. The export scratch
//! directory belongs to a single invocation and is removed on every exit.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use launchpad_client::ClientError;
use launchpad_core::domain::execution::ExecutionRecord;
use launchpad_core::domain::task::TaskInfo;
use launchpad_core::domain::template::{LATEST_VERSION, WorkflowTemplate, normalize_version};
use launchpad_core::dto::submission::SubmitTrainingRun;
use thiserror::Error;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::repository::{AnnotationStore, DatasetExporter, ExportError, TemplateCatalog};
use crate::service::cancellation::Cancellation;
use crate::service::parameters::{
    ANNOTATION_PATH, DUMP_FORMAT, OUTPUT_PATH, ParameterResolver, ResolvedParameters, TaskFacts,
};
use crate::service::paths::PathGenerator;
use crate::service::submitter::{SubmissionError, WorkflowSubmitter, correlation_labels};
use crate::service::uploader::{ArtifactUploader, UploadError};

/// A validated submit-training-run request
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub task_id: u64,
    pub template_uid: String,
    pub template_version: Option<String>,
    pub parameters: BTreeMap<String, String>,
    pub dump_format: Option<String>,
}

impl SubmissionRequest {
    /// Validates an inbound request before any external call is made
    pub fn from_dto(task_id: u64, dto: SubmitTrainingRun) -> Result<Self, PipelineError> {
        if task_id == 0 {
            return Err(PipelineError::InvalidRequest(
                "task id must be a positive integer".to_string(),
            ));
        }

        let template_uid = dto
            .workflow_template
            .as_deref()
            .map(str::trim)
            .filter(|uid| !uid.is_empty())
            .ok_or_else(|| PipelineError::InvalidRequest("workflow_template is required".to_string()))?
            .to_string();

        let parameters = dto.parameter_values();

        Ok(Self {
            task_id,
            template_uid,
            template_version: dto.workflow_template_version,
            parameters,
            dump_format: dto.dump_format.filter(|f| !f.trim().is_empty()),
        })
    }
}

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvingParameters,
    CheckingPrerequisite,
    Exporting,
    Uploading,
    Submitting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ResolvingParameters => "resolving parameters",
            Stage::CheckingPrerequisite => "checking prerequisite",
            Stage::Exporting => "exporting",
            Stage::Uploading => "uploading",
            Stage::Submitting => "submitting",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("task {0} not found")]
    TaskNotFound(u64),

    #[error("workflow template {uid} (version {version}) not found")]
    TemplateNotFound { uid: String, version: String },

    #[error("annotation store error: {0}")]
    AnnotationStore(String),

    #[error("template catalog error: {0}")]
    Catalog(String),

    #[error("checkpoint {0} not found")]
    PrerequisiteNotFound(String),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("submission failed: {0}")]
    Submission(#[from] SubmissionError),

    #[error("submission cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TaskNotFound(_) | Self::TemplateNotFound { .. } | Self::PrerequisiteNotFound(_)
        )
    }
}

/// Terminal failure: the stage that failed and why
#[derive(Debug, Error)]
#[error("{stage} failed: {error}")]
pub struct PipelineFailure {
    pub stage: Stage,
    #[source]
    pub error: PipelineError,
}

fn failed<E: Into<PipelineError>>(stage: Stage) -> impl FnOnce(E) -> PipelineFailure {
    move |e| PipelineFailure {
        stage,
        error: e.into(),
    }
}

/// Per-deployment pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub namespace: String,
    pub bucket: String,
    /// Value of the `workspace-uid` label
    pub workspace_uid: String,
    /// Parent directory of export scratch directories
    pub scratch_dir: PathBuf,
    pub default_dump_format: String,
    /// Parameter whose value names a checkpoint prefix
    pub checkpoint_parameter: String,
}

/// Collaborators of the pipeline
#[derive(Clone)]
pub struct PipelineServices {
    pub annotations: Arc<dyn AnnotationStore>,
    pub catalog: Arc<dyn TemplateCatalog>,
    pub exporter: Arc<dyn DatasetExporter>,
    pub uploader: Arc<ArtifactUploader>,
    pub submitter: Arc<WorkflowSubmitter>,
    pub paths: Arc<PathGenerator>,
    pub resolver: Arc<ParameterResolver>,
}

/// Everything resolving produced that later stages need
struct Plan {
    task: TaskInfo,
    parameters: ResolvedParameters,
    dataset: Option<DatasetPlan>,
}

struct DatasetPlan {
    key_prefix: String,
    format: String,
}

#[derive(Clone)]
pub struct SubmissionPipeline {
    services: PipelineServices,
    settings: Arc<PipelineSettings>,
}

impl SubmissionPipeline {
    pub fn new(services: PipelineServices, settings: PipelineSettings) -> Self {
        Self {
            services,
            settings: Arc::new(settings),
        }
    }

    /// Runs one submission to completion
    ///
    /// Stops at the next stage boundary once `cancel` fires.
    pub async fn run(
        &self,
        request: SubmissionRequest,
        cancel: Cancellation,
    ) -> Result<ExecutionRecord, PipelineFailure> {
        let span = info_span!(
            "submission",
            submission_id = %Uuid::new_v4(),
            task_id = request.task_id,
            template_uid = %request.template_uid,
        );

        async move {
            info!("Submission started");
            match self.execute(&request, &cancel).await {
                Ok(record) => {
                    info!("Submission done: execution {}", record.uid);
                    Ok(record)
                }
                Err(failure) => {
                    error!(stage = %failure.stage, "Submission failed: {}", failure.error);
                    Err(failure)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        request: &SubmissionRequest,
        cancel: &Cancellation,
    ) -> Result<ExecutionRecord, PipelineFailure> {
        let plan = self
            .resolve(request)
            .await
            .map_err(failed(Stage::ResolvingParameters))?;

        let checkpoint = plan
            .parameters
            .get(&self.settings.checkpoint_parameter)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        if let Some(checkpoint) = checkpoint {
            self.check_prerequisite(&checkpoint, cancel)
                .await
                .map_err(failed(Stage::CheckingPrerequisite))?;
        }

        if let Some(dataset) = &plan.dataset {
            self.export_and_upload(&plan.task, dataset, cancel).await?;
        } else {
            debug!("Template does not take a dataset, skipping export");
        }

        ensure_not_cancelled(cancel).map_err(failed(Stage::Submitting))?;

        let version = normalize_version(request.template_version.as_deref());
        let version = (version != LATEST_VERSION).then_some(version);
        let labels = correlation_labels(&self.settings.workspace_uid, request.task_id);

        self.services
            .submitter
            .submit(&request.template_uid, version.as_deref(), plan.parameters, labels)
            .await
            .map_err(failed(Stage::Submitting))
    }

    /// Fetches the task and template and computes the parameter list
    async fn resolve(&self, request: &SubmissionRequest) -> Result<Plan, PipelineError> {
        let task = self
            .services
            .annotations
            .get_task(request.task_id)
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => PipelineError::TaskNotFound(request.task_id),
                e => PipelineError::AnnotationStore(e.to_string()),
            })?;

        let template = self.fetch_template(request).await?;
        debug!(
            "Template {} declares {} parameter(s)",
            template.uid,
            template.parameters.len()
        );

        let takes_dataset = template.declares(ANNOTATION_PATH);
        let format = if takes_dataset || template.declares(DUMP_FORMAT) {
            Some(self.choose_format(request.dump_format.as_deref()).await?)
        } else {
            None
        };

        let annotation_path = takes_dataset.then(|| self.services.paths.dataset_path(&task.name));
        let output_path = template
            .declares(OUTPUT_PATH)
            .then(|| self.services.paths.output_path(&task.name, &template.uid));

        let facts = TaskFacts {
            label_count: task.label_count(),
            annotation_path: annotation_path.clone(),
            output_path,
            dump_format: format.clone(),
            template_uid: template.uid.clone(),
        };
        let parameters =
            self.services
                .resolver
                .resolve(&template.parameter_names(), &request.parameters, &facts);
        debug!(
            "Resolved {} parameter(s): {:?}",
            parameters.len(),
            parameters.iter().map(|p| p.name.as_str()).collect::<Vec<_>>()
        );

        let dataset = match (annotation_path, format) {
            (Some(key_prefix), Some(format)) => Some(DatasetPlan { key_prefix, format }),
            _ => None,
        };

        Ok(Plan {
            task,
            parameters,
            dataset,
        })
    }

    async fn fetch_template(&self, request: &SubmissionRequest) -> Result<WorkflowTemplate, PipelineError> {
        let version = normalize_version(request.template_version.as_deref());

        self.services
            .catalog
            .get_template(&self.settings.namespace, &request.template_uid, &version)
            .await
            .map_err(|e: ClientError| match e {
                e if e.is_not_found() => PipelineError::TemplateNotFound {
                    uid: request.template_uid.clone(),
                    version,
                },
                e => PipelineError::Catalog(e.to_string()),
            })
    }

    /// Picks the requested format when the exporter supports it, the default otherwise
    async fn choose_format(&self, requested: Option<&str>) -> Result<String, ExportError> {
        let default = &self.settings.default_dump_format;
        let Some(requested) = requested else {
            return Ok(default.clone());
        };

        let formats = self.services.exporter.formats().await?;
        match formats
            .iter()
            .find(|f| f.tag == requested || f.name == requested)
        {
            Some(format) => Ok(format.tag.clone()),
            None => {
                warn!(
                    "Dump format '{}' is not supported, falling back to '{}'",
                    requested, default
                );
                Ok(default.clone())
            }
        }
    }

    async fn check_prerequisite(&self, checkpoint: &str, cancel: &Cancellation) -> Result<(), PipelineError> {
        ensure_not_cancelled(cancel)?;
        info!("Verifying checkpoint {}", checkpoint);

        let exists = self
            .services
            .uploader
            .verify_prefix_exists(&self.settings.bucket, checkpoint)
            .await?;

        if !exists {
            return Err(PipelineError::PrerequisiteNotFound(checkpoint.to_string()));
        }
        Ok(())
    }

    async fn export_and_upload(
        &self,
        task: &TaskInfo,
        dataset: &DatasetPlan,
        cancel: &Cancellation,
    ) -> Result<(), PipelineFailure> {
        ensure_not_cancelled(cancel).map_err(failed(Stage::Exporting))?;

        let scratch = tempfile::Builder::new()
            .prefix("launchpad-export-")
            .tempdir_in(&self.settings.scratch_dir)
            .map_err(|e| failed(Stage::Exporting)(ExportError::Io(e)))?;

        info!("Exporting task {} as {}", task.id, dataset.format);
        let files = self
            .services
            .exporter
            .export(task.id, &task.owner, &dataset.format, scratch.path())
            .await
            .map_err(failed(Stage::Exporting))?;
        debug!("Export produced {} file(s)", files.len());

        ensure_not_cancelled(cancel).map_err(failed(Stage::Uploading))?;

        let uploaded = self
            .services
            .uploader
            .upload_tree(scratch.path(), &self.settings.bucket, &dataset.key_prefix, cancel)
            .await
            .map_err(|e| match e {
                UploadError::Cancelled { .. } => PipelineError::Cancelled,
                e => PipelineError::Upload(e),
            })
            .map_err(failed(Stage::Uploading))?;
        info!("Dataset uploaded to {} ({} object(s))", dataset.key_prefix, uploaded);

        if let Err(e) = scratch.close() {
            warn!("Failed to remove export scratch directory: {}", e);
        }
        Ok(())
    }
}

fn ensure_not_cancelled(cancel: &Cancellation) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }
    Ok(())
}
