//! Object storage repository
//!
//! Thin access to an S3-compatible bucket: prefix listing and object writes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload, WriteMultipart};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;

/// Parts allowed in flight per multipart upload
const MAX_PARTS_IN_FLIGHT: usize = 4;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object store error: {0}")]
    Backend(#[from] object_store::Error),

    #[error("failed to read local file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid object key '{key}': {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: object_store::path::Error,
    },
}

/// Repository trait for object storage operations
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Lists the keys of every object under `prefix`
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Writes an object in a single request
    async fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>)
    -> Result<(), StorageError>;

    /// Streams a local file into an object as a multipart upload
    async fn put_object_multipart(
        &self,
        bucket: &str,
        key: &str,
        file: &Path,
        part_size: usize,
    ) -> Result<(), StorageError>;
}

/// S3 implementation of ObjectStorage
///
/// Credentials are read from the standard `AWS_*` environment variables.
/// One client is built per bucket on first use and reused afterwards.
pub struct S3ObjectStorage {
    endpoint: Option<String>,
    region: String,
    stores: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl S3ObjectStorage {
    /// Creates a new S3 storage
    ///
    /// # Arguments
    /// * `endpoint` - Full endpoint URL for non-AWS stores (e.g., "http://minio:9000")
    /// * `region` - Bucket region
    pub fn new(endpoint: Option<String>, region: String) -> Self {
        Self {
            endpoint,
            region,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Storage whose bucket is served by an already built store
    #[cfg(test)]
    pub fn with_store(bucket: &str, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            endpoint: None,
            region: String::new(),
            stores: Mutex::new(HashMap::from([(bucket.to_string(), store)])),
        }
    }

    async fn store(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, StorageError> {
        let mut stores = self.stores.lock().await;
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }

        let store: Arc<dyn ObjectStore> = Arc::new(self.build(bucket)?);
        stores.insert(bucket.to_string(), store.clone());
        Ok(store)
    }

    fn build(&self, bucket: &str) -> Result<object_store::aws::AmazonS3, StorageError> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(&self.region);

        if let Some(endpoint) = &self.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"))
                .with_virtual_hosted_style_request(false);
        }

        Ok(builder.build()?)
    }
}

/// Object path for a key, kept exactly as written
///
/// Unlike `ObjectPath::from`, no segment is percent-encoded.
fn object_path(key: &str) -> Result<ObjectPath, StorageError> {
    ObjectPath::parse(key).map_err(|source| StorageError::InvalidKey {
        key: key.to_string(),
        source,
    })
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        let store = self.store(bucket).await?;
        let prefix = object_path(prefix)?;

        let keys: Vec<String> = store
            .list(Some(&prefix))
            .map_ok(|meta| meta.location.to_string())
            .try_collect()
            .await?;

        Ok(keys)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
    ) -> Result<(), StorageError> {
        let path = object_path(key)?;
        let store = self.store(bucket).await?;
        store
            .put(&path, PutPayload::from(data))
            .await?;
        Ok(())
    }

    async fn put_object_multipart(
        &self,
        bucket: &str,
        key: &str,
        file: &Path,
        part_size: usize,
    ) -> Result<(), StorageError> {
        let path = object_path(key)?;
        let store = self.store(bucket).await?;
        let mut file = tokio::fs::File::open(file).await?;

        let upload = store.put_multipart(&path).await?;
        let mut writer = WriteMultipart::new_with_chunk_size(upload, part_size);
        let mut buf = vec![0u8; part_size];

        loop {
            let read = match file.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    let _ = writer.abort().await;
                    return Err(e.into());
                }
            };
            writer.wait_for_capacity(MAX_PARTS_IN_FLIGHT).await?;
            writer.write(&buf[..read]);
        }

        writer.finish().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use object_store::memory::InMemory;

    use super::*;

    const PREFIX: &str = "annotation-dump/Street scenes #2/03042021050607/";

    fn storage() -> S3ObjectStorage {
        S3ObjectStorage::with_store("bucket", Arc::new(InMemory::new()))
    }

    #[test]
    fn test_object_path_keeps_key_verbatim() {
        for key in [
            "annotation-dump/Street scenes #2/03042021050607/label_map.pbtxt",
            "annotation-dump/cars [v2]/03042021050607/default.tfrecord",
            "annotation-dump/100%/03042021050607/images/frame_000000.jpg",
        ] {
            assert_eq!(object_path(key).unwrap().to_string(), key);
        }
    }

    #[test]
    fn test_object_path_rejects_relative_segments() {
        let err = object_path("annotation-dump/../secrets").unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey { ref key, .. } if key == "annotation-dump/../secrets"));

        assert!(object_path("annotation-dump//demo").is_err());
    }

    #[tokio::test]
    async fn test_written_key_is_prefix_plus_relative_path() {
        let storage = storage();
        let key = format!("{}label_map.pbtxt", PREFIX);

        storage
            .put_object("bucket", &key, b"item {}".to_vec())
            .await
            .unwrap();

        let keys = storage.list_objects("bucket", PREFIX).await.unwrap();
        assert_eq!(keys, vec![key]);
    }

    #[tokio::test]
    async fn test_multipart_key_is_kept_verbatim() {
        let storage = storage();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("default.tfrecord");
        tokio::fs::write(&file, vec![7u8; 64]).await.unwrap();
        let key = "annotation-dump/100%/03042021050607/default.tfrecord";

        storage
            .put_object_multipart("bucket", key, &file, 16)
            .await
            .unwrap();

        let keys = storage
            .list_objects("bucket", "annotation-dump/100%/")
            .await
            .unwrap();
        assert_eq!(keys, vec![key.to_string()]);
    }

    #[tokio::test]
    async fn test_store_is_built_once_per_bucket() {
        let storage = storage();
        let first = storage.store("bucket").await.unwrap();
        let second = storage.store("bucket").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_listing_other_prefix_is_empty() {
        let storage = storage();
        storage
            .put_object("bucket", &format!("{}label_map.pbtxt", PREFIX), Vec::new())
            .await
            .unwrap();

        let keys = storage
            .list_objects("bucket", "annotation-dump/Street scenes %232/")
            .await
            .unwrap();
        assert!(keys.is_empty());
    }
}
