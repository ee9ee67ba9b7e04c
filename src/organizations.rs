//! Organization operations.

use std::sync::Arc;

use serde_json::json;

use crate::client::{ApiClient, ApiRequest};
use crate::error::TfcResult;
use crate::jsonapi::{ListDocument, ResourceObject};

/// Attributes accepted when creating an organization.
///
/// <https://www.terraform.io/docs/cloud/api/organizations.html#request-body>
#[derive(Debug, Clone)]
pub struct CreateOrganization {
    pub name: String,
    pub email: String,
    pub session_timeout: Option<u32>,
    pub session_remember: Option<u32>,
    /// `"password"` or `"two_factor_mandatory"`.
    pub collaborator_auth_policy: String,
    pub cost_estimation_enabled: Option<bool>,
    pub owners_team_saml_role_id: Option<String>,
}

impl CreateOrganization {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            session_timeout: None,
            session_remember: None,
            collaborator_auth_policy: "password".to_string(),
            cost_estimation_enabled: None,
            owners_team_saml_role_id: None,
        }
    }
}

/// Organization capability over the shared request engine.
#[derive(Debug, Clone)]
pub struct Organizations {
    api: Arc<ApiClient>,
}

impl Organizations {
    pub(crate) fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Create an organization. Attributes go out kebab-case on the wire.
    pub async fn create(&self, body: &CreateOrganization) -> TfcResult<ResourceObject> {
        let request = ApiRequest::post(
            "/api/v2/organizations",
            json!({
                "data": {
                    "type": "organizations",
                    "attributes": {
                        "name": body.name,
                        "email": body.email,
                        "session-timeout": body.session_timeout,
                        "session-remember": body.session_remember,
                        "collaborator-auth-policy": body.collaborator_auth_policy,
                        "cost-estimation-enabled": body.cost_estimation_enabled,
                        "owners-team-saml-role-id": body.owners_team_saml_role_id,
                    }
                }
            }),
        );
        self.api.request(&request).await
    }

    /// Delete an organization by name.
    pub async fn delete(&self, organization: &str) -> TfcResult<()> {
        self.api
            .delete(format!("/api/v2/organizations/{organization}"))
            .await
    }

    /// Read a single organization by name.
    pub async fn read(&self, organization: &str) -> TfcResult<ResourceObject> {
        self.api
            .request(&ApiRequest::get(format!(
                "/api/v2/organizations/{organization}"
            )))
            .await
    }

    /// The entitlement set (feature-flag bundle) for an organization's
    /// subscription tier.
    pub async fn entitlement_set(&self, organization: &str) -> TfcResult<ResourceObject> {
        self.api
            .request(&ApiRequest::get(format!(
                "/api/v2/organizations/{organization}/entitlement-set"
            )))
            .await
    }

    /// Fetch a single page of organizations.
    ///
    /// Callers that want every organization should use [`Self::iterate`],
    /// which follows the pagination metadata page by page.
    pub async fn list(&self) -> TfcResult<ListDocument> {
        self.api
            .list(&ApiRequest::get("/api/v2/organizations"))
            .await
    }

    /// Stream every organization visible to the token.
    pub async fn iterate<F>(&self, callback: F) -> TfcResult<()>
    where
        F: FnMut(&ResourceObject, &[ResourceObject]) -> TfcResult<()>,
    {
        self.api
            .iterate_items(ApiRequest::get("/api/v2/organizations"), callback)
            .await
    }

    /// Stream organization memberships, optionally including the related
    /// `user` and `teams` records in each page's side data.
    pub async fn iterate_memberships<F>(
        &self,
        organization: &str,
        include_users: bool,
        include_teams: bool,
        callback: F,
    ) -> TfcResult<()>
    where
        F: FnMut(&ResourceObject, &[ResourceObject]) -> TfcResult<()>,
    {
        let mut included = Vec::new();
        if include_users {
            included.push("user");
        }
        if include_teams {
            included.push("teams");
        }

        // An empty include list omits the parameter entirely.
        let include = (!included.is_empty()).then(|| included.join(","));

        let request = ApiRequest::get(format!(
            "/api/v2/organizations/{organization}/organization-memberships"
        ))
        .with_query("include", include);

        self.api.iterate_items(request, callback).await
    }

    /// Stream an organization's workspaces.
    pub async fn iterate_workspaces<F>(&self, organization: &str, callback: F) -> TfcResult<()>
    where
        F: FnMut(&ResourceObject, &[ResourceObject]) -> TfcResult<()>,
    {
        self.api
            .iterate_items(
                ApiRequest::get(format!("/api/v2/organizations/{organization}/workspaces")),
                callback,
            )
            .await
    }

    /// Stream an organization's teams.
    pub async fn iterate_teams<F>(&self, organization: &str, callback: F) -> TfcResult<()>
    where
        F: FnMut(&ResourceObject, &[ResourceObject]) -> TfcResult<()>,
    {
        self.api
            .iterate_items(
                ApiRequest::get(format!("/api/v2/organizations/{organization}/teams")),
                callback,
            )
            .await
    }

    /// Stream an organization's VCS OAuth tokens.
    pub async fn iterate_oauth_tokens<F>(&self, organization: &str, callback: F) -> TfcResult<()>
    where
        F: FnMut(&ResourceObject, &[ResourceObject]) -> TfcResult<()>,
    {
        self.api
            .iterate_items(
                ApiRequest::get(format!("/api/v2/organizations/{organization}/oauth-tokens")),
                callback,
            )
            .await
    }
}
