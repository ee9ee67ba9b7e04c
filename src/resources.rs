//! Mapping Terraform resource types to graph object references.
//!
//! Apply-log hooks name the concrete provider resource that was deployed.
//! The resolver turns a hook into the type/key pair of the corresponding
//! record in the external asset graph, so the run can be related to assets
//! ingested by other connectors.

use std::collections::{HashMap, HashSet};

use crate::apply_log::ApplyHook;

/// A typed reference into the external asset graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    /// Canonical graph object type.
    pub object_type: String,
    /// Graph object key.
    pub key: String,
}

/// Custom key derivation for a mapped resource type.
type KeyFn = fn(&ApplyHook) -> Option<String>;

/// One entry of the resource-type mapping table.
#[derive(Debug, Clone)]
pub struct ResourceMapping {
    /// Canonical graph object type for this Terraform resource type.
    pub object_type: &'static str,
    /// Custom key rule; the default is the hook's reported id value verbatim.
    pub build_key: Option<KeyFn>,
}

impl ResourceMapping {
    fn plain(object_type: &'static str) -> Self {
        Self {
            object_type,
            build_key: None,
        }
    }
}

fn bucket_key(hook: &ApplyHook) -> Option<String> {
    hook.id_value.as_ref().map(|id| format!("bucket:{id}"))
}

/// Resolves apply-log hooks to graph object references.
///
/// Immutable after construction. The default resolver supports the `google`
/// provider with the catalog below; construct with [`ResourceTypeResolver::new`]
/// to inject a different table.
#[derive(Debug, Clone)]
pub struct ResourceTypeResolver {
    providers: HashSet<String>,
    mappings: HashMap<&'static str, ResourceMapping>,
}

impl Default for ResourceTypeResolver {
    fn default() -> Self {
        let mappings = HashMap::from([
            ("google_project", ResourceMapping::plain("google_cloud_project")),
            (
                "google_project_service",
                ResourceMapping::plain("google_cloud_api_service"),
            ),
            (
                "google_cloudfunctions_function",
                ResourceMapping::plain("google_cloud_function"),
            ),
            ("google_folder", ResourceMapping::plain("google_cloud_folder")),
            (
                "google_organization",
                ResourceMapping::plain("google_cloud_organization"),
            ),
            (
                "google_project_iam_custom_role",
                ResourceMapping::plain("google_iam_role"),
            ),
            (
                "google_storage_bucket",
                ResourceMapping {
                    object_type: "google_storage_bucket",
                    build_key: Some(bucket_key),
                },
            ),
        ]);

        Self {
            providers: HashSet::from(["google".to_string()]),
            mappings,
        }
    }
}

impl ResourceTypeResolver {
    /// Build a resolver with a custom provider allow-list and mapping table.
    #[must_use]
    pub fn new(
        providers: impl IntoIterator<Item = String>,
        mappings: HashMap<&'static str, ResourceMapping>,
    ) -> Self {
        Self {
            providers: providers.into_iter().collect(),
            mappings,
        }
    }

    /// Whether hooks from this provider produce references at all.
    #[must_use]
    pub fn supports_provider(&self, provider: &str) -> bool {
        self.providers.contains(provider)
    }

    /// Resolve a hook to a graph object reference.
    ///
    /// Returns `None` for unsupported providers (the corpus contains many
    /// unrelated providers, so this is not an error) and for hooks without an
    /// id value when no custom key rule applies. Resource types missing from
    /// the table fall back to the raw type and id, keeping forward
    /// compatibility with uncataloged provider resources.
    #[must_use]
    pub fn resolve(&self, hook: &ApplyHook) -> Option<ResourceRef> {
        if !self.supports_provider(&hook.resource.implied_provider) {
            return None;
        }

        let resource_type = hook.resource.resource_type.as_str();

        if let Some(mapping) = self.mappings.get(resource_type) {
            let key = match mapping.build_key {
                Some(build_key) => build_key(hook)?,
                None => hook.id_value.clone()?,
            };
            return Some(ResourceRef {
                object_type: mapping.object_type.to_string(),
                key,
            });
        }

        Some(ResourceRef {
            object_type: resource_type.to_string(),
            key: hook.id_value.clone()?,
        })
    }
}
