//! Structured apply-log parsing.
//!
//! When a workspace has structured run output enabled, Terraform Cloud stores
//! the apply log as newline-delimited JSON following the machine-readable UI
//! format: <https://www.terraform.io/docs/internals/machine-readable-ui.html>.
//! Logs may freely mix structured and free-text lines, so anything that is not
//! a well-formed JSON object with a non-empty `@message` is skipped silently.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TfcResult;

/// Operation message types emitted by the machine-readable UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyEventKind {
    ApplyStart,
    ApplyProgress,
    ApplyComplete,
    ApplyErrored,
    ProvisionStart,
    ProvisionProgress,
    ProvisionComplete,
    ProvisionErrored,
    RefreshStart,
    RefreshComplete,
}

impl ApplyEventKind {
    /// The wire representation of this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyEventKind::ApplyStart => "apply_start",
            ApplyEventKind::ApplyProgress => "apply_progress",
            ApplyEventKind::ApplyComplete => "apply_complete",
            ApplyEventKind::ApplyErrored => "apply_errored",
            ApplyEventKind::ProvisionStart => "provision_start",
            ApplyEventKind::ProvisionProgress => "provision_progress",
            ApplyEventKind::ProvisionComplete => "provision_complete",
            ApplyEventKind::ProvisionErrored => "provision_errored",
            ApplyEventKind::RefreshStart => "refresh_start",
            ApplyEventKind::RefreshComplete => "refresh_complete",
        }
    }
}

impl std::fmt::Display for ApplyEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApplyEventKind {
    type Err = UnknownApplyEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apply_start" => Ok(ApplyEventKind::ApplyStart),
            "apply_progress" => Ok(ApplyEventKind::ApplyProgress),
            "apply_complete" => Ok(ApplyEventKind::ApplyComplete),
            "apply_errored" => Ok(ApplyEventKind::ApplyErrored),
            "provision_start" => Ok(ApplyEventKind::ProvisionStart),
            "provision_progress" => Ok(ApplyEventKind::ProvisionProgress),
            "provision_complete" => Ok(ApplyEventKind::ProvisionComplete),
            "provision_errored" => Ok(ApplyEventKind::ProvisionErrored),
            "refresh_start" => Ok(ApplyEventKind::RefreshStart),
            "refresh_complete" => Ok(ApplyEventKind::RefreshComplete),
            _ => Err(UnknownApplyEventKind(s.to_string())),
        }
    }
}

/// Error parsing an apply event kind from its wire string.
#[derive(Debug, Clone)]
pub struct UnknownApplyEventKind(String);

impl std::fmt::Display for UnknownApplyEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown apply event kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownApplyEventKind {}

/// The resource instance a hook refers to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HookResource {
    /// Full resource address, e.g. `module.storage.google_storage_bucket.logs`.
    pub addr: String,
    /// Owning module address, empty for the root module.
    #[serde(default)]
    pub module: String,
    /// Resource address without the module prefix.
    #[serde(default)]
    pub resource: String,
    /// Provider implied by the resource type, e.g. `google`.
    pub implied_provider: String,
    /// Terraform resource type, e.g. `google_storage_bucket`.
    pub resource_type: String,
    /// Resource name within its type.
    #[serde(default)]
    pub resource_name: String,
    /// Instance key for `count`/`for_each` resources.
    #[serde(default)]
    pub resource_key: Option<serde_json::Value>,
}

/// Hook payload describing one resource instance and the action taken on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplyHook {
    pub resource: HookResource,
    /// Lifecycle action, e.g. `create`, `update`, `delete`.
    #[serde(default)]
    pub action: Option<String>,
    /// Name of the identifying attribute, e.g. `id`.
    #[serde(default)]
    pub id_key: Option<String>,
    /// Value of the identifying attribute.
    #[serde(default)]
    pub id_value: Option<String>,
    #[serde(default)]
    pub elapsed_seconds: Option<f64>,
}

/// One parsed line of structured apply output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplyLogEvent {
    #[serde(rename = "@level", default)]
    pub level: Option<String>,
    #[serde(rename = "@message")]
    pub message: String,
    #[serde(rename = "@module", default)]
    pub module: Option<String>,
    #[serde(rename = "@timestamp", default)]
    pub timestamp: Option<String>,
    /// Raw event type. Unrecognized values are retained, not filtered.
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    /// Present on operation messages that act on a specific resource.
    #[serde(default)]
    pub hook: Option<ApplyHook>,
}

impl ApplyLogEvent {
    /// The recognized kind of this event, if any.
    pub fn kind(&self) -> Option<ApplyEventKind> {
        self.event_type.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Parse one log line into an event.
///
/// Validity is decided on the raw JSON alone: an object with a non-empty
/// string `@message` is an event, whatever else it carries. The remaining
/// fields are extracted best-effort, so a `hook` that does not match the
/// expected shape degrades to `None` instead of rejecting the line.
fn event_from_line(line: &str) -> Option<ApplyLogEvent> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    let object = value.as_object()?;

    let message = object.get("@message")?.as_str()?;
    if message.is_empty() {
        return None;
    }

    let str_field = |key: &str| {
        object
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    };

    Some(ApplyLogEvent {
        level: str_field("@level"),
        message: message.to_string(),
        module: str_field("@module"),
        timestamp: str_field("@timestamp"),
        event_type: str_field("type"),
        hook: object
            .get("hook")
            .cloned()
            .and_then(|hook| serde_json::from_value(hook).ok()),
    })
}

/// Parse a raw apply log into its structured events.
///
/// A line is accepted iff it parses as a JSON object carrying a non-empty
/// `@message`; everything else (free-text lines, blank lines, non-object
/// JSON) is dropped without error.
#[must_use]
pub fn parse_apply_log(text: &str) -> Vec<ApplyLogEvent> {
    text.lines().filter_map(event_from_line).collect()
}

/// Download the full apply log from its archivist URL.
///
/// The URL comes from the run's `apply` record and is pre-authorized; the
/// request carries no API credentials and is never retried here.
pub async fn download_apply_log(http: &reqwest::Client, url: &str) -> TfcResult<String> {
    let response = http.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Download and parse an apply log, keeping only `apply_complete` events.
///
/// These are the only events expected to carry a fully-populated hook, which
/// is what relationship derivation needs. A log without structured output
/// yields an empty list rather than an error.
pub async fn collect_apply_complete(
    http: &reqwest::Client,
    url: &str,
) -> TfcResult<Vec<ApplyLogEvent>> {
    let text = download_apply_log(http, url).await?;
    Ok(parse_apply_log(&text)
        .into_iter()
        .filter(|event| event.kind() == Some(ApplyEventKind::ApplyComplete))
        .collect())
}
