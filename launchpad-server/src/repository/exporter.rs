//! Dataset exporter repository
//!
//! The exporter materializes a task's annotations in a requested dump format
//! as files under a local destination directory. Format implementations live
//! in the annotation store; this side requests the archive and unpacks it.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use launchpad_client::{AnnotationClient, ClientError, ExportPolling};
use launchpad_core::domain::task::DumpFormat;
use thiserror::Error;
use tracing::{debug, warn};
use zip::ZipArchive;

/// Errors produced while exporting a dataset
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("task {0} is unknown to the exporter")]
    UnknownTask(u64),

    #[error("dump format '{0}' is not supported")]
    UnsupportedFormat(String),

    #[error("exporter request failed: {0}")]
    Remote(#[source] ClientError),

    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("export archive is unreadable: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Capability to export a task's dataset to local files
#[async_trait]
pub trait DatasetExporter: Send + Sync {
    /// Formats the exporter can produce
    async fn formats(&self) -> Result<Vec<DumpFormat>, ExportError>;

    /// Exports a task into `destination`, returning the files produced
    ///
    /// # Arguments
    /// * `task_id` - The task to export
    /// * `owner` - Identity of the task owner
    /// * `format` - Dump format tag
    /// * `destination` - Existing directory to write into
    async fn export(
        &self,
        task_id: u64,
        owner: &str,
        format: &str,
        destination: &Path,
    ) -> Result<Vec<PathBuf>, ExportError>;
}

/// Exporter backed by the annotation store's dataset export endpoint
///
/// The store returns the dataset as a zip archive, which is unpacked into the
/// destination so the uploaded tree is the dataset itself.
pub struct HttpDatasetExporter {
    client: AnnotationClient,
    polling: ExportPolling,
}

impl HttpDatasetExporter {
    pub fn new(client: AnnotationClient, polling: ExportPolling) -> Self {
        Self { client, polling }
    }
}

#[async_trait]
impl DatasetExporter for HttpDatasetExporter {
    async fn formats(&self) -> Result<Vec<DumpFormat>, ExportError> {
        self.client
            .list_dataset_formats()
            .await
            .map_err(ExportError::Remote)
    }

    async fn export(
        &self,
        task_id: u64,
        owner: &str,
        format: &str,
        destination: &Path,
    ) -> Result<Vec<PathBuf>, ExportError> {
        debug!("Exporting task {} (owner {}) as {}", task_id, owner, format);

        let archive = self
            .client
            .export_dataset(task_id, format, self.polling)
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => ExportError::UnknownTask(task_id),
                ClientError::ApiError { status: 400, .. } => {
                    ExportError::UnsupportedFormat(format.to_string())
                }
                e => ExportError::Remote(e),
            })?;

        debug!("Unpacking {} byte archive for task {}", archive.len(), task_id);
        let destination = destination.to_path_buf();
        tokio::task::spawn_blocking(move || unpack_archive(&archive, &destination))
            .await
            .map_err(|e| ExportError::Io(std::io::Error::other(e)))?
    }
}

/// Extracts every file of a zip archive under `destination`
///
/// Entries whose name would escape the destination are skipped.
fn unpack_archive(archive: &[u8], destination: &Path) -> Result<Vec<PathBuf>, ExportError> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    let mut files = Vec::with_capacity(zip.len());

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping archive entry with unsafe name '{}'", entry.name());
            continue;
        };

        let path = destination.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&path)?;
            continue;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut out = std::fs::File::create(&path)?;
        std::io::copy(&mut entry, &mut out)?;
        files.push(path);
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use std::io::Write;

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    use super::*;

    fn archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_unpack_produces_dataset_tree() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = archive(&[
            ("label_map.pbtxt", b"item { id: 1 name: 'car' }"),
            ("default.tfrecord", b"records"),
            ("images/frame_000000.jpg", b"jpeg"),
        ]);

        let mut files = unpack_archive(&bytes, dir.path()).unwrap();
        files.sort();

        assert_eq!(
            files,
            vec![
                dir.path().join("default.tfrecord"),
                dir.path().join("images/frame_000000.jpg"),
                dir.path().join("label_map.pbtxt"),
            ]
        );
        assert_eq!(
            std::fs::read(dir.path().join("images/frame_000000.jpg")).unwrap(),
            b"jpeg"
        );
        assert!(!dir.path().join("task_7_cvat_tfrecord.zip").exists());
    }

    #[test]
    fn test_unpack_rejects_non_archive() {
        let dir = tempfile::tempdir().unwrap();
        let err = unpack_archive(b"not a zip", dir.path()).unwrap_err();
        assert!(matches!(err, ExportError::Archive(_)));
    }

    #[test]
    fn test_remote_error_keeps_source() {
        let err = ExportError::Remote(ClientError::api_error(502, "bad gateway"));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "API error (status 502): bad gateway");
    }
}
