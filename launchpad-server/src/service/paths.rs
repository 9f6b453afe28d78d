//! Storage path generation
//!
//! Paths are stamped with the current time at second resolution. Two calls for
//! the same task within the same second produce the same path; callers that
//! need more than one path per second must disambiguate themselves.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Timestamp layout used in every generated path (month, day, year, time)
pub const STAMP_FORMAT: &str = "%m%d%Y%H%M%S";

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Builds dataset and model-output paths for tasks
pub struct PathGenerator {
    dataset_root: String,
    sync_dir: String,
    model_dir: String,
    clock: Arc<dyn Clock>,
}

impl PathGenerator {
    /// Creates a new path generator
    ///
    /// # Arguments
    /// * `dataset_root` - Root of exported datasets (e.g., "annotation-dump")
    /// * `sync_dir` - Workflow sync directory (e.g., "workflow-data")
    /// * `model_dir` - Model output directory under the sync dir (e.g., "output")
    /// * `clock` - Time source for stamps
    pub fn new(
        dataset_root: impl Into<String>,
        sync_dir: impl Into<String>,
        model_dir: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            dataset_root: trim_slashes(dataset_root.into()),
            sync_dir: trim_slashes(sync_dir.into()),
            model_dir: trim_slashes(model_dir.into()),
            clock,
        }
    }

    /// `<dataset_root>/<task>/<stamp>/`
    pub fn dataset_path(&self, task_name: &str) -> String {
        format!("{}/{}/{}/", self.dataset_root, task_name, self.stamp())
    }

    /// `<sync_dir>/<model_dir>/<task>/<run_uid>/<stamp>/`
    pub fn output_path(&self, task_name: &str, run_uid: &str) -> String {
        format!(
            "{}/{}/{}/{}/",
            self.output_root(),
            task_name,
            run_uid,
            self.stamp()
        )
    }

    /// `<sync_dir>/<model_dir>`, the parent of every model output
    pub fn output_root(&self) -> String {
        format!("{}/{}", self.sync_dir, self.model_dir)
    }

    fn stamp(&self) -> String {
        self.clock.now().format(STAMP_FORMAT).to_string()
    }
}

fn trim_slashes(s: String) -> String {
    s.trim_matches('/').to_string()
}


#[cfg(test)]
mod tests {
    use super::test_support::fixed_paths;
    use super::*;

    #[test]
    fn test_dataset_path() {
        let paths = fixed_paths();
        assert_eq!(
            paths.dataset_path("demo"),
            "annotation-dump/demo/03042021050607/"
        );
    }

    #[test]
    fn test_output_path() {
        let paths = fixed_paths();
        assert_eq!(
            paths.output_path("demo", "maskrcnn-training"),
            "workflow-data/output/demo/maskrcnn-training/03042021050607/"
        );
        assert_eq!(paths.output_root(), "workflow-data/output");
    }

    #[test]
    fn test_roots_are_normalized() {
        let instant = "2021-12-31T23:59:58Z".parse().unwrap();
        let paths = PathGenerator::new(
            "/dumps/",
            "sync/",
            "/models",
            Arc::new(test_support::FixedClock(instant)),
        );
        assert_eq!(paths.dataset_path("t"), "dumps/t/12312021235958/");
        assert_eq!(paths.output_path("t", "u"), "sync/models/t/u/12312021235958/");
    }

    #[test]
    fn test_same_second_paths_collide() {
        let paths = fixed_paths();
        assert_eq!(paths.dataset_path("demo"), paths.dataset_path("demo"));
    }
}
