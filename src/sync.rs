//! Mapped records and cross-stage helpers.
//!
//! Typed views over the normalized attribute bags, plus the glue between a
//! run's `apply` side-record, its structured log, and the resource graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::apply_log::collect_apply_complete;
use crate::error::{TfcError, TfcResult};
use crate::jsonapi::ResourceObject;
use crate::resources::{ResourceRef, ResourceTypeResolver};

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Lightweight organization identity threaded between pipeline stages.
///
/// Later stages (memberships, workspaces, teams) only need the name to build
/// request paths and the external id to anchor relationships, so this is the
/// unit cached by the orchestration layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrganizationSummary {
    pub name: String,
    pub external_id: String,
}

impl OrganizationSummary {
    /// Extract the summary from an organization record.
    pub fn from_record(record: &ResourceObject) -> TfcResult<Self> {
        Ok(Self {
            name: record
                .attr_str("name")
                .ok_or_else(|| TfcError::Config("organization record missing name".into()))?
                .to_string(),
            external_id: record
                .attr_str("externalId")
                .ok_or_else(|| TfcError::Config("organization record missing externalId".into()))?
                .to_string(),
        })
    }
}

/// Organization details mapped from normalized attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedOrganization {
    pub external_id: String,
    pub name: String,
    pub email: Option<String>,
    pub created_at: Option<String>,
    pub collaborator_auth_policy: Option<String>,
    #[serde(default)]
    pub plan_expired: bool,
    #[serde(default)]
    pub plan_is_trial: bool,
    #[serde(default)]
    pub plan_is_enterprise: bool,
    #[serde(default)]
    pub cost_estimation_enabled: bool,
    #[serde(default)]
    pub saml_enabled: bool,
    #[serde(default)]
    pub two_factor_conformant: bool,
}

impl MappedOrganization {
    pub fn from_record(record: &ResourceObject) -> TfcResult<Self> {
        Ok(serde_json::from_value(serde_json::Value::Object(
            record.attributes.clone(),
        ))?)
    }
}

/// User details mapped from an included membership side-record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedUser {
    /// Record id, filled in from the resource object rather than attributes.
    #[serde(skip)]
    pub user_id: String,
    pub username: Option<String>,
    #[serde(default)]
    pub is_service_account: bool,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub two_factor: Option<TwoFactorStatus>,
}

/// Two-factor posture reported on a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwoFactorStatus {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub verified: bool,
}

impl MappedUser {
    pub fn from_record(record: &ResourceObject) -> TfcResult<Self> {
        let mut user: MappedUser =
            serde_json::from_value(serde_json::Value::Object(record.attributes.clone()))?;
        user.user_id = record.id.clone();
        Ok(user)
    }
}

/// Workspace details mapped from normalized attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedWorkspace {
    #[serde(skip)]
    pub workspace_id: String,
    pub name: Option<String>,
    pub created_at: Option<String>,
    pub terraform_version: Option<String>,
    #[serde(default)]
    pub auto_apply: bool,
    #[serde(default)]
    pub speculative_enabled: bool,
    pub working_directory: Option<String>,
    pub environment: Option<String>,
    #[serde(default)]
    pub resource_count: Option<u64>,
}

impl MappedWorkspace {
    pub fn from_record(record: &ResourceObject) -> TfcResult<Self> {
        let mut workspace: MappedWorkspace =
            serde_json::from_value(serde_json::Value::Object(record.attributes.clone()))?;
        workspace.workspace_id = record.id.clone();
        Ok(workspace)
    }
}

/// Team details mapped from normalized attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedTeam {
    #[serde(skip)]
    pub team_id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub users_count: Option<u64>,
    pub visibility: Option<String>,
}

impl MappedTeam {
    pub fn from_record(record: &ResourceObject) -> TfcResult<Self> {
        let mut team: MappedTeam =
            serde_json::from_value(serde_json::Value::Object(record.attributes.clone()))?;
        team.team_id = record.id.clone();
        Ok(team)
    }
}

/// Run details mapped from normalized attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedRun {
    #[serde(skip)]
    pub run_id: String,
    pub status: Option<String>,
    pub message: Option<String>,
    pub created_at: Option<String>,
    pub source: Option<String>,
    #[serde(default)]
    pub has_changes: bool,
    #[serde(default)]
    pub is_destroy: bool,
}

impl MappedRun {
    pub fn from_record(record: &ResourceObject) -> TfcResult<Self> {
        let mut run: MappedRun =
            serde_json::from_value(serde_json::Value::Object(record.attributes.clone()))?;
        run.run_id = record.id.clone();
        Ok(run)
    }

    /// Creation timestamp, parsed.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.created_at.as_deref())
    }
}

/// Entitlement set (feature-flag bundle) mapped from normalized attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedEntitlementSet {
    #[serde(default)]
    pub operations: bool,
    #[serde(default)]
    pub state_storage: bool,
    #[serde(default)]
    pub sentinel: bool,
    #[serde(default)]
    pub teams: bool,
    #[serde(default)]
    pub vcs_integrations: bool,
    #[serde(default)]
    pub private_module_registry: bool,
    #[serde(default)]
    pub sso: bool,
    #[serde(default)]
    pub audit_logging: bool,
    #[serde(default)]
    pub agents: bool,
    #[serde(default)]
    pub cost_estimation: bool,
}

impl MappedEntitlementSet {
    pub fn from_record(record: &ResourceObject) -> TfcResult<Self> {
        Ok(serde_json::from_value(serde_json::Value::Object(
            record.attributes.clone(),
        ))?)
    }
}

/// Find the apply-log URL for a run via its `apply` relationship.
///
/// Requires the run to have been fetched with the `apply` include so the
/// apply record is present in the page's side data.
pub fn find_apply_log_url(run: &ResourceObject, included: &[ResourceObject]) -> Option<String> {
    run.find_related("apply", included)
        .and_then(|apply| apply.attr_str("logReadUrl"))
        .map(str::to_string)
}

/// Derive graph object references for everything a run deployed.
///
/// Downloads and parses the run's apply log, then resolves the hook of every
/// `apply_complete` event. Hooks the resolver declines (unsupported provider,
/// missing id) are skipped. A non-structured log yields an empty list.
pub async fn collect_run_resource_refs(
    http: &reqwest::Client,
    resolver: &ResourceTypeResolver,
    log_url: &str,
) -> TfcResult<Vec<ResourceRef>> {
    let events = collect_apply_complete(http, log_url).await?;
    let refs: Vec<ResourceRef> = events
        .iter()
        .filter_map(|event| event.hook.as_ref())
        .filter_map(|hook| resolver.resolve(hook))
        .collect();

    debug!(
        events = events.len(),
        refs = refs.len(),
        "derived resource references from apply log"
    );
    Ok(refs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonapi::resource_from_value;
    use serde_json::json;

    fn organization_record() -> ResourceObject {
        resource_from_value(json!({
            "id": "acme",
            "type": "organizations",
            "attributes": {
                "external-id": "org-WCuSN5XZgnsYcJwn",
                "name": "acme",
                "email": "ops@acme.example",
                "created-at": "2021-01-05T20:16:20.000Z",
                "collaborator-auth-policy": "password",
                "plan-expired": false,
                "plan-is-trial": true,
                "plan-is-enterprise": false,
                "cost-estimation-enabled": true,
                "saml-enabled": false,
                "two-factor-conformant": true
            }
        }))
        .unwrap()
    }

    #[test]
    fn organization_maps_from_normalized_attributes() {
        let mapped = MappedOrganization::from_record(&organization_record()).unwrap();
        assert_eq!(mapped.external_id, "org-WCuSN5XZgnsYcJwn");
        assert_eq!(mapped.name, "acme");
        assert!(mapped.plan_is_trial);
        assert!(mapped.cost_estimation_enabled);
        assert_eq!(mapped.collaborator_auth_policy.as_deref(), Some("password"));
    }

    #[test]
    fn organization_summary_extracts_cache_pair() {
        let summary = OrganizationSummary::from_record(&organization_record()).unwrap();
        assert_eq!(
            summary,
            OrganizationSummary {
                name: "acme".to_string(),
                external_id: "org-WCuSN5XZgnsYcJwn".to_string(),
            }
        );
    }

    #[test]
    fn summary_requires_external_id() {
        let record = resource_from_value(json!({
            "id": "acme",
            "type": "organizations",
            "attributes": {"name": "acme"}
        }))
        .unwrap();
        assert!(OrganizationSummary::from_record(&record).is_err());
    }

    #[test]
    fn user_maps_two_factor_status() {
        let record = resource_from_value(json!({
            "id": "user-1",
            "type": "users",
            "attributes": {
                "username": "alice",
                "is-service-account": false,
                "avatar-url": "https://example/avatar.png",
                "two-factor": {"enabled": true, "verified": false}
            }
        }))
        .unwrap();

        let mapped = MappedUser::from_record(&record).unwrap();
        assert_eq!(mapped.user_id, "user-1");
        assert_eq!(mapped.username.as_deref(), Some("alice"));
        let two_factor = mapped.two_factor.unwrap();
        assert!(two_factor.enabled);
        assert!(!two_factor.verified);
    }

    #[test]
    fn run_maps_and_parses_timestamp() {
        let record = resource_from_value(json!({
            "id": "run-1",
            "type": "runs",
            "attributes": {
                "status": "applied",
                "message": "Queued manually",
                "created-at": "2021-09-13T14:36:25.403Z",
                "has-changes": true,
                "is-destroy": false
            }
        }))
        .unwrap();

        let mapped = MappedRun::from_record(&record).unwrap();
        assert_eq!(mapped.run_id, "run-1");
        assert_eq!(mapped.status.as_deref(), Some("applied"));
        assert!(mapped.has_changes);
        assert!(mapped.created_at_utc().is_some());
    }

    #[test]
    fn entitlement_set_maps_feature_flags() {
        let record = resource_from_value(json!({
            "id": "org-entitlements",
            "type": "entitlement-sets",
            "attributes": {
                "operations": true,
                "state-storage": true,
                "sentinel": false,
                "teams": false,
                "vcs-integrations": true,
                "private-module-registry": true,
                "sso": false,
                "audit-logging": false,
                "agents": false,
                "cost-estimation": false
            }
        }))
        .unwrap();

        let mapped = MappedEntitlementSet::from_record(&record).unwrap();
        assert!(mapped.operations);
        assert!(mapped.vcs_integrations);
        assert!(!mapped.sso);
    }

    #[test]
    fn apply_log_url_follows_the_apply_relationship() {
        let run = resource_from_value(json!({
            "id": "run-1",
            "type": "runs",
            "attributes": {},
            "relationships": {
                "apply": {"data": {"id": "apply-1", "type": "applies"}}
            }
        }))
        .unwrap();
        let included = vec![resource_from_value(json!({
            "id": "apply-1",
            "type": "applies",
            "attributes": {"log-read-url": "https://archivist.example/run-1"}
        }))
        .unwrap()];

        assert_eq!(
            find_apply_log_url(&run, &included).as_deref(),
            Some("https://archivist.example/run-1")
        );
        assert_eq!(find_apply_log_url(&run, &[]), None);
    }
}
