//! Common test utilities for tfc-connector integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::MockServer;

use tfc_connector::{RetryConfig, TfcClient, TfcConfig, TfcCredentials};

/// API token used by all mock-server tests.
pub const TEST_TOKEN: &str = "test-api-token";

/// Build a connector config pointed at the mock server, with fast retries.
pub fn test_config(server: &MockServer) -> TfcConfig {
    TfcConfig::default()
        .with_base_url(server.uri())
        .with_retry(RetryConfig::for_testing())
}

/// Build a full client against the mock server.
pub fn test_client(server: &MockServer) -> TfcClient {
    TfcClient::new(test_config(server), TfcCredentials::new(TEST_TOKEN))
        .expect("test config must be valid")
}

/// Test data factory for an organization resource, kebab-case as on the wire.
pub fn organization(name: &str) -> Value {
    json!({
        "id": name,
        "type": "organizations",
        "attributes": {
            "external-id": format!("org-{name}"),
            "name": name,
            "email": format!("ops@{name}.example"),
            "created-at": "2021-01-05T20:16:20.000Z",
            "collaborator-auth-policy": "password",
            "plan-expired": false,
            "plan-is-trial": true,
            "plan-is-enterprise": false,
            "cost-estimation-enabled": false,
            "saml-enabled": false,
            "two-factor-conformant": true
        }
    })
}

/// Test data factory for an organization membership with a user relationship.
pub fn membership(id: &str, user_id: &str) -> Value {
    json!({
        "id": id,
        "type": "organization-memberships",
        "attributes": {"status": "active"},
        "relationships": {
            "user": {"data": {"id": user_id, "type": "users"}}
        }
    })
}

/// Test data factory for an included user record.
pub fn user_record(user_id: &str, username: &str) -> Value {
    json!({
        "id": user_id,
        "type": "users",
        "attributes": {
            "username": username,
            "is-service-account": false,
            "avatar-url": format!("https://avatars.example/{username}.png"),
            "two-factor": {"enabled": true, "verified": true}
        }
    })
}

/// Test data factory for a run with an `apply` relationship.
pub fn run_with_apply(run_id: &str, apply_id: &str) -> Value {
    json!({
        "id": run_id,
        "type": "runs",
        "attributes": {
            "status": "applied",
            "message": "Queued manually",
            "created-at": "2021-09-13T14:36:25.403Z",
            "has-changes": true,
            "is-destroy": false
        },
        "relationships": {
            "apply": {"data": {"id": apply_id, "type": "applies"}}
        }
    })
}

/// Test data factory for an included apply record carrying the log URL.
pub fn apply_record(apply_id: &str, log_read_url: &str) -> Value {
    json!({
        "id": apply_id,
        "type": "applies",
        "attributes": {
            "status": "finished",
            "log-read-url": log_read_url
        }
    })
}

/// Wrap items in a JSON:API list document with pagination metadata.
pub fn list_response(
    items: Vec<Value>,
    included: Vec<Value>,
    current_page: u32,
    next_page: Option<u32>,
    total_pages: u32,
    total_count: u64,
) -> Value {
    let mut response = json!({
        "data": items,
        "included": included,
        "links": {"self": "https://app.terraform.io/api/v2"},
        "meta": {
            "pagination": {
                "current-page": current_page,
                "total-pages": total_pages,
                "total-count": total_count
            }
        }
    });
    if let Some(next) = next_page {
        response["meta"]["pagination"]["next-page"] = json!(next);
    }
    response
}

/// A structured apply-log line with an `apply_complete` hook.
pub fn apply_complete_line(provider: &str, resource_type: &str, id_value: &str) -> String {
    json!({
        "@level": "info",
        "@message": format!("{resource_type}.demo: Creation complete after 2s [id={id_value}]"),
        "@module": "terraform.ui",
        "@timestamp": "2021-09-13T14:36:25.403Z",
        "type": "apply_complete",
        "hook": {
            "resource": {
                "addr": format!("{resource_type}.demo"),
                "module": "",
                "resource": format!("{resource_type}.demo"),
                "implied_provider": provider,
                "resource_type": resource_type,
                "resource_name": "demo",
                "resource_key": null
            },
            "action": "create",
            "id_key": "id",
            "id_value": id_value,
            "elapsed_seconds": 2.0
        }
    })
    .to_string()
}

/// A structured apply-log line without a hook (non-complete variants).
pub fn apply_progress_line(kind: &str) -> String {
    json!({
        "@level": "info",
        "@message": "Still creating...",
        "@module": "terraform.ui",
        "@timestamp": "2021-09-13T14:36:24.123Z",
        "type": kind
    })
    .to_string()
}
