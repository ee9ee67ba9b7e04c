//! Terraform Cloud connector.
//!
//! Polls the Terraform Cloud JSON:API (organizations, workspaces, users,
//! teams, runs, deployed resources) and maps the paginated responses into
//! normalized records plus cross-system resource references, ready for
//! ingestion by an asset-inventory pipeline.
//!
//! # Overview
//!
//! - [`ApiClient`] performs authenticated requests with transient/permanent
//!   error classification and bounded exponential-backoff retry.
//! - [`ListPager`] / [`ApiClient::iterate_items`] drive list endpoints page
//!   by page, handing each item to the caller with that page's `included`
//!   side-records.
//! - [`normalize_keys`] converts kebab-case wire attributes to camelCase.
//! - [`parse_apply_log`] extracts structured events from a run's apply log;
//!   [`ResourceTypeResolver`] turns their hooks into graph references.
//!
//! # Example
//!
//! ```no_run
//! use tfc_connector::{TfcClient, TfcConfig, TfcCredentials};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TfcClient::new(
//!     TfcConfig::default(),
//!     TfcCredentials::new("my-api-token"),
//! )?;
//!
//! let mut names = Vec::new();
//! client
//!     .organizations()
//!     .iterate(|org, _included| {
//!         names.extend(org.attr_str("name").map(str::to_string));
//!         Ok(())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod apply_log;
mod client;
mod config;
mod error;
mod jsonapi;
mod normalize;
mod organizations;
mod resources;
mod retry;
mod sync;
mod users;
mod workspaces;

// Re-exports
pub use apply_log::{
    collect_apply_complete, download_apply_log, parse_apply_log, ApplyEventKind, ApplyHook,
    ApplyLogEvent, HookResource,
};
pub use client::{ApiClient, ApiRequest, ListPager, TfcClient};
pub use config::{TfcConfig, TfcCredentials, DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE};
pub use error::{ApiErrorDetail, ApiErrorSource, TfcError, TfcResult, NO_RETRY_STATUS_CODES};
pub use jsonapi::{
    resource_from_value, ListDocument, ListMeta, Pagination, Relationship, ResourceLinkage,
    ResourceObject,
};
pub use normalize::{normalize_keys, normalize_map};
pub use organizations::{CreateOrganization, Organizations};
pub use resources::{ResourceMapping, ResourceRef, ResourceTypeResolver};
pub use retry::{RetryConfig, RetryEvent, RetryObserver};
pub use sync::{
    collect_run_resource_refs, find_apply_log_url, MappedEntitlementSet, MappedOrganization,
    MappedRun, MappedTeam, MappedUser, MappedWorkspace, OrganizationSummary, TwoFactorStatus,
};
pub use users::{Account, Users};
pub use workspaces::{RunIncludes, Workspaces};
