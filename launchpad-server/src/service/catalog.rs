//! Catalog Service
//!
//! Read-through access to workflow templates and the cluster node pool.

use std::sync::Arc;

use launchpad_client::ClientError;
use launchpad_core::domain::task::NodePool;
use launchpad_core::domain::template::{ParameterSpec, normalize_version};
use launchpad_core::dto::catalog::TemplateList;
use thiserror::Error;

use crate::repository::TemplateCatalog;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("workflow template {uid} (version {version}) not found")]
    TemplateNotFound { uid: String, version: String },

    #[error("template catalog error: {0}")]
    Remote(#[from] ClientError),
}

pub struct CatalogService {
    catalog: Arc<dyn TemplateCatalog>,
    namespace: String,
    label_filter: Option<String>,
}

impl CatalogService {
    /// Creates a new catalog service
    ///
    /// # Arguments
    /// * `catalog` - Remote template catalog
    /// * `namespace` - Namespace every call is scoped to
    /// * `label_filter` - Label selector applied to template listings
    pub fn new(
        catalog: Arc<dyn TemplateCatalog>,
        namespace: impl Into<String>,
        label_filter: Option<String>,
    ) -> Self {
        Self {
            catalog,
            namespace: namespace.into(),
            label_filter: label_filter.filter(|l| !l.trim().is_empty()),
        }
    }

    /// List templates made available to annotators
    pub async fn list_templates(
        &self,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<TemplateList, CatalogError> {
        let page = page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE);
        let page_size = page_size.filter(|s| *s > 0).unwrap_or(DEFAULT_PAGE_SIZE);

        tracing::debug!("Listing workflow templates (page {}, size {})", page, page_size);

        let list = self
            .catalog
            .list_templates(&self.namespace, self.label_filter.as_deref(), page, page_size)
            .await?;
        Ok(list)
    }

    /// Public parameters of one template version, with their defaults
    pub async fn public_parameters(
        &self,
        uid: &str,
        version: Option<&str>,
    ) -> Result<Vec<ParameterSpec>, CatalogError> {
        let version = normalize_version(version);
        let template = self
            .catalog
            .get_template(&self.namespace, uid, &version)
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => CatalogError::TemplateNotFound {
                    uid: uid.to_string(),
                    version: version.clone(),
                },
                e => CatalogError::Remote(e),
            })?;

        Ok(template.public_parameters())
    }

    pub async fn node_pool(&self) -> Result<NodePool, CatalogError> {
        Ok(self.catalog.get_node_pool().await?)
    }
}

#[cfg(test)]
mod tests {
    use launchpad_core::domain::template::Visibility::{Private, Public};

    use super::*;
    use crate::service::fakes::{FakeCatalog, template};

    fn service(catalog: Arc<FakeCatalog>) -> CatalogService {
        CatalogService::new(catalog, "research", Some("key=used-by,value=cvat".to_string()))
    }

    #[tokio::test]
    async fn test_public_parameters_only() {
        let catalog = Arc::new(FakeCatalog::with(vec![template(
            "maskrcnn-training",
            &[("cvat-annotation-path", Private), ("epochs", Public), ("hyperparameters", Public)],
        )]));

        let params = service(catalog.clone())
            .public_parameters("maskrcnn-training", None)
            .await
            .unwrap();

        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["epochs", "hyperparameters"]);
        assert_eq!(*catalog.requested_versions.lock().unwrap(), vec!["0".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_template() {
        let catalog = Arc::new(FakeCatalog::default());
        let err = service(catalog)
            .public_parameters("missing", Some("3"))
            .await
            .unwrap_err();

        match err {
            CatalogError::TemplateNotFound { uid, version } => {
                assert_eq!(uid, "missing");
                assert_eq!(version, "3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_list_applies_filter_and_defaults() {
        let catalog = Arc::new(FakeCatalog::with(vec![template("a", &[])]));

        let list = service(catalog.clone()).list_templates(None, Some(0)).await.unwrap();

        assert_eq!(list.workflow_templates.len(), 1);
        assert_eq!(
            *catalog.list_queries.lock().unwrap(),
            vec![(Some("key=used-by,value=cvat".to_string()), 1, 100)]
        );
    }

    #[tokio::test]
    async fn test_blank_filter_is_dropped() {
        let catalog = Arc::new(FakeCatalog::default());
        CatalogService::new(catalog.clone(), "research", Some(" ".to_string()))
            .list_templates(Some(2), Some(10))
            .await
            .unwrap();

        assert_eq!(*catalog.list_queries.lock().unwrap(), vec![(None, 2, 10)]);
    }
}
