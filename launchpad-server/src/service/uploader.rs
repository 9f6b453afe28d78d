//! Artifact uploader
//!
//! Copies an exported dataset tree into object storage and checks that
//! referenced objects exist before the pipeline commits to an export.
//!
//! Uploads are not transactional. When one file fails the whole upload is
//! reported failed, but objects already written stay in the bucket.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::repository::{ObjectStorage, StorageError};
use crate::service::cancellation::Cancellation;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to upload {key}: {source}")]
    Transfer { key: String, source: StorageError },

    #[error("failed to list objects under {prefix}: {source}")]
    Listing { prefix: String, source: StorageError },

    #[error("upload cancelled after {uploaded} object(s)")]
    Cancelled { uploaded: usize },

    #[error("upload worker failed: {0}")]
    Worker(String),
}

/// Upload tuning knobs
#[derive(Debug, Clone, Copy)]
pub struct UploadSettings {
    /// Maximum number of files in flight
    pub concurrency: usize,
    /// Files larger than this many bytes are uploaded in parts
    pub multipart_threshold: u64,
    /// Size of each part of a multipart upload
    pub part_size: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            concurrency: 10,
            multipart_threshold: 64 * 1024 * 1024,
            part_size: 16 * 1024 * 1024,
        }
    }
}

/// A local file and the key it is uploaded to
#[derive(Debug)]
struct UploadItem {
    path: PathBuf,
    key: String,
    size: u64,
}

pub struct ArtifactUploader {
    storage: Arc<dyn ObjectStorage>,
    settings: UploadSettings,
}

impl ArtifactUploader {
    pub fn new(storage: Arc<dyn ObjectStorage>, settings: UploadSettings) -> Self {
        Self { storage, settings }
    }

    /// Returns whether at least one object exists under `prefix`
    pub async fn verify_prefix_exists(&self, bucket: &str, prefix: &str) -> Result<bool, UploadError> {
        debug!("Checking for objects under {}/{}", bucket, prefix);

        let keys = self
            .storage
            .list_objects(bucket, prefix)
            .await
            .map_err(|source| UploadError::Listing {
                prefix: prefix.to_string(),
                source,
            })?;

        Ok(!keys.is_empty())
    }

    /// Uploads every file under `local_root` to `key_prefix + relative_path`
    ///
    /// Returns the number of objects written. No new transfer starts once a
    /// transfer has failed or `cancel` fires; transfers already running are
    /// awaited before returning.
    pub async fn upload_tree(
        &self,
        local_root: &Path,
        bucket: &str,
        key_prefix: &str,
        cancel: &Cancellation,
    ) -> Result<usize, UploadError> {
        let items = collect_files(local_root, key_prefix).await?;
        info!(
            "Uploading {} file(s) from {} to {}/{}",
            items.len(),
            local_root.display(),
            bucket,
            key_prefix
        );

        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut tasks: JoinSet<Result<String, UploadError>> = JoinSet::new();
        let mut uploaded = 0usize;
        let mut failure: Option<UploadError> = None;
        let mut cancelled = false;

        for item in items {
            while let Some(joined) = tasks.try_join_next() {
                record(joined, &mut uploaded, &mut failure);
            }
            if failure.is_some() {
                break;
            }
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| UploadError::Worker(e.to_string()))?;

            let storage = Arc::clone(&self.storage);
            let bucket = bucket.to_string();
            let settings = self.settings;

            tasks.spawn(async move {
                let result = transfer(storage.as_ref(), &bucket, &item, settings).await;
                drop(permit);
                result.map(|_| item.key)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            record(joined, &mut uploaded, &mut failure);
        }

        if let Some(err) = failure {
            warn!("Upload to {}/{} failed after {} object(s)", bucket, key_prefix, uploaded);
            return Err(err);
        }
        if cancelled {
            return Err(UploadError::Cancelled { uploaded });
        }

        info!("Uploaded {} object(s) to {}/{}", uploaded, bucket, key_prefix);
        Ok(uploaded)
    }
}

fn record(
    joined: Result<Result<String, UploadError>, tokio::task::JoinError>,
    uploaded: &mut usize,
    failure: &mut Option<UploadError>,
) {
    let outcome = joined.map_err(|e| UploadError::Worker(e.to_string())).and_then(|r| r);
    match outcome {
        Ok(key) => {
            debug!("Uploaded {}", key);
            *uploaded += 1;
        }
        Err(err) => {
            warn!("{}", err);
            failure.get_or_insert(err);
        }
    }
}

async fn transfer(
    storage: &dyn ObjectStorage,
    bucket: &str,
    item: &UploadItem,
    settings: UploadSettings,
) -> Result<(), UploadError> {
    let sent = if item.size > settings.multipart_threshold {
        storage
            .put_object_multipart(bucket, &item.key, &item.path, settings.part_size)
            .await
    } else {
        let data = tokio::fs::read(&item.path)
            .await
            .map_err(|source| UploadError::Read {
                path: item.path.clone(),
                source,
            })?;
        storage.put_object(bucket, &item.key, data).await
    };

    sent.map_err(|source| UploadError::Transfer {
        key: item.key.clone(),
        source,
    })
}

/// Walks `root` and pairs every regular file with its object key
async fn collect_files(root: &Path, key_prefix: &str) -> Result<Vec<UploadItem>, UploadError> {
    let read_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| UploadError::Read { path, source }
    };

    let mut items = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(read_err(&dir))?;

        while let Some(entry) = entries.next_entry().await.map_err(read_err(&dir))? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(read_err(&path))?;

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                let size = entry.metadata().await.map_err(read_err(&path))?.len();
                let key = format!("{}{}", key_prefix, relative_key(root, &path));
                items.push(UploadItem { path, key, size });
            }
        }
    }

    items.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(items)
}

/// Relative path of `path` under `root`, '/'-separated
fn relative_key(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}


#[cfg(test)]
mod tests {
    use super::test_support::{Put, RecordingStorage};
    use super::*;

    fn write_tree(root: &Path) {
        std::fs::create_dir_all(root.join("images/train")).unwrap();
        std::fs::write(root.join("labels.txt"), b"cat\ndog\n").unwrap();
        std::fs::write(root.join("images/train/0001.tfrecord"), b"abc").unwrap();
        std::fs::write(root.join("images/train/0002.tfrecord"), b"defgh").unwrap();
    }

    #[tokio::test]
    async fn test_upload_tree_keys_by_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        write_tree(dir.path());

        let storage = Arc::new(RecordingStorage::default());
        let uploader = ArtifactUploader::new(storage.clone(), UploadSettings::default());

        let count = uploader
            .upload_tree(dir.path(), "bucket", "annotation-dump/demo/1/", &Cancellation::new())
            .await
            .unwrap();

        assert_eq!(count, 3);
        assert_eq!(
            storage.keys(),
            vec![
                "annotation-dump/demo/1/images/train/0001.tfrecord",
                "annotation-dump/demo/1/images/train/0002.tfrecord",
                "annotation-dump/demo/1/labels.txt",
            ]
        );
    }

    #[tokio::test]
    async fn test_large_files_use_multipart() {
        let dir = tempfile::tempdir().unwrap();
        write_tree(dir.path());

        let storage = Arc::new(RecordingStorage::default());
        let settings = UploadSettings {
            concurrency: 2,
            multipart_threshold: 4,
            part_size: 4,
        };
        let uploader = ArtifactUploader::new(storage.clone(), settings);

        uploader
            .upload_tree(dir.path(), "bucket", "p/", &Cancellation::new())
            .await
            .unwrap();

        let puts = storage.puts.lock().unwrap().clone();
        assert!(puts.contains(&Put::Single("p/images/train/0001.tfrecord".into())));
        assert!(puts.contains(&Put::Multipart("p/images/train/0002.tfrecord".into())));
        assert!(puts.contains(&Put::Multipart("p/labels.txt".into())));
    }

    #[tokio::test]
    async fn test_single_failure_fails_upload() {
        let dir = tempfile::tempdir().unwrap();
        write_tree(dir.path());

        let mut storage = RecordingStorage::default();
        storage.fail_keys.insert("p/labels.txt".to_string());
        let storage = Arc::new(storage);
        let uploader = ArtifactUploader::new(storage.clone(), UploadSettings::default());

        let err = uploader
            .upload_tree(dir.path(), "bucket", "p/", &Cancellation::new())
            .await
            .unwrap_err();

        match err {
            UploadError::Transfer { key, .. } => assert_eq!(key, "p/labels.txt"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!storage.keys().contains(&"p/labels.txt".to_string()));
    }

    #[tokio::test]
    async fn test_cancelled_upload_starts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_tree(dir.path());

        let storage = Arc::new(RecordingStorage::default());
        let uploader = ArtifactUploader::new(storage.clone(), UploadSettings::default());
        let cancel = Cancellation::new();
        cancel.cancel();

        let err = uploader
            .upload_tree(dir.path(), "bucket", "p/", &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Cancelled { uploaded: 0 }));
        assert!(storage.keys().is_empty());
    }

    #[tokio::test]
    async fn test_empty_tree_uploads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(RecordingStorage::default());
        let uploader = ArtifactUploader::new(storage, UploadSettings::default());

        let count = uploader
            .upload_tree(dir.path(), "bucket", "p/", &Cancellation::new())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_verify_prefix_exists() {
        let storage = Arc::new(RecordingStorage::with_objects(&[
            "ns/workflow-data/output/demo/maskrcnn-training/01012021000000/model.h5",
        ]));
        let uploader = ArtifactUploader::new(storage, UploadSettings::default());

        assert!(
            uploader
                .verify_prefix_exists("bucket", "ns/workflow-data/output/demo/")
                .await
                .unwrap()
        );
        assert!(
            !uploader
                .verify_prefix_exists("bucket", "ns/workflow-data/output/other/")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_verify_prefix_listing_failure_is_distinct() {
        let storage = Arc::new(RecordingStorage {
            fail_listing: true,
            ..Default::default()
        });
        let uploader = ArtifactUploader::new(storage, UploadSettings::default());

        let err = uploader.verify_prefix_exists("bucket", "x/").await.unwrap_err();
        assert!(matches!(err, UploadError::Listing { .. }));
    }

    #[test]
    fn test_relative_key_uses_forward_slashes() {
        let root = Path::new("/tmp/export");
        let path = root.join("a").join("b.txt");
        assert_eq!(relative_key(root, &path), "a/b.txt");
    }
}
