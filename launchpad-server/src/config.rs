//! Server configuration
//!
//! Everything is read from environment variables. Defaults match a standard
//! deployment next to the annotation store.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};

use crate::service::ClassOffsets;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,

    /// Base URL of the catalog and orchestrator API
    pub onepanel_url: String,
    pub onepanel_token: Option<String>,
    /// Namespace every catalog and orchestrator call is scoped to
    pub namespace: String,
    /// Value of the `workspace-uid` label on created executions
    pub workspace_uid: String,
    /// Label selector for template listings
    pub workflows_label: String,
    pub sync_dir: String,
    pub model_dir: String,
    /// Root of uploaded datasets in the bucket
    pub dataset_prefix: String,

    /// Base URL of the annotation store
    pub cvat_url: String,
    pub cvat_token: Option<String>,
    /// Parent directory of export scratch directories
    pub scratch_dir: PathBuf,

    pub default_dump_format: String,
    pub class_offsets: ClassOffsets,
    pub checkpoint_parameter: String,

    pub upload_concurrency: usize,
    pub multipart_threshold: u64,
    pub multipart_part_size: usize,
    pub export_poll_interval: Duration,
    pub export_max_polls: u32,
    /// Per-request timeout of the remote HTTP clients
    pub http_timeout: Duration,

    pub s3_bucket: String,
    /// Endpoint host of a non-AWS store (e.g., "minio:9000")
    pub s3_endpoint: Option<String>,
    pub s3_insecure: bool,
    pub s3_region: String,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Required: ONEPANEL_API_URL, ONEPANEL_RESOURCE_NAMESPACE, S3_BUCKET.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| anyhow::anyhow!("{} environment variable not set", key))
        };
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let bind_addr = or("LAUNCHPAD_BIND_ADDR", "0.0.0.0:8090")
            .parse()
            .context("LAUNCHPAD_BIND_ADDR is not a socket address")?;

        let class_offsets = ClassOffsets::parse(&or(
            "LAUNCHPAD_CLASS_COUNT_OFFSETS",
            "maskrcnn-training=1",
        ))
        .context("invalid LAUNCHPAD_CLASS_COUNT_OFFSETS")?;

        let s3_insecure = match var("S3_INSECURE") {
            Some(v) => parse_bool(&v).context("S3_INSECURE must be true or false")?,
            None => false,
        };

        Ok(Self {
            bind_addr,
            onepanel_url: required("ONEPANEL_API_URL")?,
            onepanel_token: var("ONEPANEL_API_TOKEN"),
            namespace: required("ONEPANEL_RESOURCE_NAMESPACE")?,
            workspace_uid: lookup("ONEPANEL_RESOURCE_UID").unwrap_or_default(),
            workflows_label: or("CVAT_ONEPANEL_WORKFLOWS_LABEL", "key=used-by,value=cvat"),
            sync_dir: or("ONEPANEL_SYNC_DIRECTORY", "workflow-data"),
            model_dir: or("ONEPANEL_WORKFLOW_MODEL_DIR", "output"),
            dataset_prefix: or("CVAT_ANNOTATIONS_OBJECT_STORAGE_PREFIX", "annotation-dump"),
            cvat_url: or("CVAT_API_URL", "http://localhost:8080"),
            cvat_token: var("CVAT_API_TOKEN"),
            scratch_dir: var("CVAT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            default_dump_format: or("LAUNCHPAD_DEFAULT_DUMP_FORMAT", "cvat_tfrecord"),
            class_offsets,
            checkpoint_parameter: or("LAUNCHPAD_CHECKPOINT_PARAMETER", "cvat-finetune-checkpoint"),
            upload_concurrency: parse_or(var("LAUNCHPAD_UPLOAD_CONCURRENCY"), 10)?,
            multipart_threshold: parse_or(var("LAUNCHPAD_MULTIPART_THRESHOLD"), 64 * 1024 * 1024)?,
            multipart_part_size: parse_or(var("LAUNCHPAD_MULTIPART_PART_SIZE"), 16 * 1024 * 1024)?,
            export_poll_interval: Duration::from_secs(parse_or(
                var("LAUNCHPAD_EXPORT_POLL_INTERVAL"),
                3,
            )?),
            export_max_polls: parse_or(var("LAUNCHPAD_EXPORT_MAX_POLLS"), 200)?,
            http_timeout: Duration::from_secs(parse_or(var("LAUNCHPAD_HTTP_TIMEOUT"), 300)?),
            s3_bucket: required("S3_BUCKET")?,
            s3_endpoint: var("S3_ENDPOINT"),
            s3_insecure,
            s3_region: or("S3_REGION", "us-east-1"),
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.namespace.trim().is_empty() {
            bail!("namespace cannot be empty");
        }

        if self.s3_bucket.trim().is_empty() {
            bail!("s3_bucket cannot be empty");
        }

        for (name, url) in [("onepanel_url", &self.onepanel_url), ("cvat_url", &self.cvat_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!("{} must start with http:// or https://", name);
            }
        }

        if self.upload_concurrency == 0 {
            bail!("upload_concurrency must be greater than 0");
        }

        if self.multipart_part_size == 0 {
            bail!("multipart_part_size must be greater than 0");
        }

        if self.multipart_part_size as u64 > self.multipart_threshold {
            bail!("multipart_part_size cannot exceed multipart_threshold");
        }

        if self.export_max_polls == 0 {
            bail!("export_max_polls must be greater than 0");
        }

        Ok(())
    }

    /// Full URL of the object store endpoint, if one is configured
    pub fn s3_endpoint_url(&self) -> Option<String> {
        self.s3_endpoint.as_ref().map(|endpoint| {
            if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                endpoint.clone()
            } else if self.s3_insecure {
                format!("http://{}", endpoint)
            } else {
                format!("https://{}", endpoint)
            }
        })
    }
}

fn parse_or<T>(value: Option<String>, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("invalid numeric value '{}'", v)),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => bail!("not a boolean: {}", other),
    }
}
