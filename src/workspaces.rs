//! Workspace operations.

use std::sync::Arc;

use crate::client::{ApiClient, ApiRequest};
use crate::error::TfcResult;
use crate::jsonapi::ResourceObject;

/// Which related records to include alongside workspace runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunIncludes {
    /// Include the `apply` record (carries the apply log URL).
    pub apply: bool,
    /// Include the configuration version the run was created from.
    pub configuration_version: bool,
    /// Include VCS ingress attributes of the configuration version.
    pub ingress_attributes: bool,
}

impl RunIncludes {
    fn to_query(self) -> Option<String> {
        let mut included = Vec::new();
        if self.apply {
            included.push("apply");
        }
        if self.configuration_version {
            included.push("configuration_version");
        }
        if self.ingress_attributes {
            included.push("configuration_version.ingress_attributes");
        }
        (!included.is_empty()).then(|| included.join(","))
    }
}

/// Workspace capability over the shared request engine.
#[derive(Debug, Clone)]
pub struct Workspaces {
    api: Arc<ApiClient>,
}

impl Workspaces {
    pub(crate) fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Stream a workspace's runs, newest first as the API returns them.
    pub async fn iterate_runs<F>(
        &self,
        workspace_id: &str,
        includes: RunIncludes,
        callback: F,
    ) -> TfcResult<()>
    where
        F: FnMut(&ResourceObject, &[ResourceObject]) -> TfcResult<()>,
    {
        let request = ApiRequest::get(format!("/api/v2/workspaces/{workspace_id}/runs"))
            .with_query("include", includes.to_query());
        self.api.iterate_items(request, callback).await
    }

    /// Stream the resources currently tracked in a workspace's state.
    pub async fn iterate_resources<F>(&self, workspace_id: &str, callback: F) -> TfcResult<()>
    where
        F: FnMut(&ResourceObject, &[ResourceObject]) -> TfcResult<()>,
    {
        self.api
            .iterate_items(
                ApiRequest::get(format!("/api/v2/workspaces/{workspace_id}/resources")),
                callback,
            )
            .await
    }
}
