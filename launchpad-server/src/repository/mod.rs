//! Repository layer
//!
//! Repositories are the seams to the external systems a submission touches:
//! the template catalog, the orchestrator, the annotation store, the dataset
//! exporter and the object store. They carry no business logic.
//!
//! All repositories are trait-based to enable testing and mocking.

mod annotations;
mod catalog;
mod exporter;
mod orchestrator;
mod storage;

// Re-export traits
pub use annotations::AnnotationStore;
pub use catalog::TemplateCatalog;
pub use exporter::DatasetExporter;
pub use orchestrator::WorkflowOrchestrator;
pub use storage::ObjectStorage;

// Re-export implementations and their error types
pub use exporter::{ExportError, HttpDatasetExporter};
pub use storage::{S3ObjectStorage, StorageError};
