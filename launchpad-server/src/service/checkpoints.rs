//! Checkpoint Service
//!
//! Lists model outputs of earlier runs that can seed a fine-tuning run.
//! Outputs live under `<namespace>/<sync_dir>/<model_dir>/<task>/<uid>/<stamp>/`.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;

use crate::repository::ObjectStorage;
use crate::service::paths::PathGenerator;

pub struct CheckpointService {
    storage: Arc<dyn ObjectStorage>,
    paths: Arc<PathGenerator>,
    namespace: String,
    bucket: String,
}

impl CheckpointService {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        paths: Arc<PathGenerator>,
        namespace: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            paths,
            namespace: namespace.into(),
            bucket: bucket.into(),
        }
    }

    /// Run directories produced by `template_uid`, optionally narrowed to a reference model
    ///
    /// A listing failure yields an empty list.
    pub async fn list(&self, template_uid: &str, reference_model: Option<&str>) -> Vec<String> {
        let root = format!("{}/{}/", self.namespace, self.paths.output_root());

        match self.storage.list_objects(&self.bucket, &root).await {
            Ok(keys) => checkpoint_dirs(&keys, &root, template_uid, reference_model),
            Err(e) => {
                warn!("Failed to list checkpoints under {}: {}", root, e);
                Vec::new()
            }
        }
    }
}

/// Distinct `<root><task>/<uid>/<stamp>/` directories, sorted
pub fn checkpoint_dirs(
    keys: &[String],
    root: &str,
    template_uid: &str,
    reference_model: Option<&str>,
) -> Vec<String> {
    let reference_model = reference_model.filter(|m| !m.is_empty());

    keys.iter()
        .filter(|key| reference_model.is_none_or(|m| key.contains(m)))
        .filter_map(|key| {
            let rest = key.strip_prefix(root)?;
            let mut segments = rest.split('/');
            let task = segments.next()?;
            let uid = segments.next()?;
            let stamp = segments.next()?;
            // Keys directly at the stamp level are not inside a run directory
            segments.next()?;

            (uid == template_uid && !task.is_empty() && !stamp.is_empty())
                .then(|| format!("{}{}/{}/{}/", root, task, uid, stamp))
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
