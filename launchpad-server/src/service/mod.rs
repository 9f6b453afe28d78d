//! Service Module
//!
//! Business logic of the submission service. Services compose repositories
//! and own all domain rules; handlers only translate HTTP to service calls.

pub mod cancellation;
pub mod catalog;
pub mod checkpoints;
pub mod parameters;
pub mod paths;
pub mod pipeline;
pub mod submitter;
pub mod task;
pub mod uploader;

#[cfg(test)]
pub(crate) mod fakes;

pub use cancellation::Cancellation;
pub use catalog::{CatalogError, CatalogService};
pub use checkpoints::CheckpointService;
pub use parameters::{ClassOffsets, ParameterResolver};
pub use paths::{PathGenerator, SystemClock};
pub use pipeline::{
    PipelineError, PipelineFailure, PipelineServices, PipelineSettings, Stage, SubmissionPipeline,
    SubmissionRequest,
};
pub use submitter::WorkflowSubmitter;
pub use task::{TaskError, TaskService};
pub use uploader::{ArtifactUploader, UploadSettings};
