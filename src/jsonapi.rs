//! JSON:API envelope types for Terraform Cloud responses.
//!
//! Terraform Cloud follows the JSON:API specification: primary data under
//! `data`, relationship side-records under `included`, pagination under
//! `meta.pagination` with kebab-case keys, and navigation `links`.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::normalize::normalize_keys;

/// One resource object: primary datum or included side-record.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceObject {
    /// Unique identifier within the resource type.
    pub id: String,
    /// Type discriminator (e.g. `"organizations"`, `"runs"`, `"applies"`).
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Normalized attribute bag.
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Named relationship references.
    #[serde(default)]
    pub relationships: HashMap<String, Relationship>,
}

impl ResourceObject {
    /// Look up a string attribute.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Identifier of a to-one relationship target, if populated.
    pub fn related_id(&self, name: &str) -> Option<&str> {
        self.relationships
            .get(name)
            .and_then(|rel| rel.data.as_ref())
            .map(|linkage| linkage.id.as_str())
    }

    /// Find the included record referenced by a to-one relationship.
    pub fn find_related<'a>(
        &self,
        name: &str,
        included: &'a [ResourceObject],
    ) -> Option<&'a ResourceObject> {
        let id = self.related_id(name)?;
        included.iter().find(|record| record.id == id)
    }
}

/// A named relationship on a resource object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relationship {
    /// Target id/type, absent when the relation is empty.
    #[serde(default)]
    pub data: Option<ResourceLinkage>,
    /// Related links (e.g. a URL to fetch the target).
    #[serde(default)]
    pub links: HashMap<String, Value>,
}

/// Target of a to-one relationship.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceLinkage {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

/// Pagination metadata, kebab-case on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    #[serde(rename = "current-page")]
    pub current_page: u32,
    #[serde(rename = "prev-page", default)]
    pub prev_page: Option<u32>,
    /// Authoritative next page number; absence terminates iteration.
    #[serde(rename = "next-page", default)]
    pub next_page: Option<u32>,
    #[serde(rename = "total-pages", default)]
    pub total_pages: u32,
    #[serde(rename = "total-count", default)]
    pub total_count: u64,
}

/// `meta` section of a list document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMeta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// A full list response: one page of records plus side data.
#[derive(Debug, Clone, Deserialize)]
pub struct ListDocument {
    pub data: Vec<ResourceObject>,
    #[serde(default)]
    pub included: Vec<ResourceObject>,
    #[serde(default)]
    pub links: HashMap<String, Value>,
    #[serde(default)]
    pub meta: Option<ListMeta>,
}

impl ListDocument {
    /// Authoritative next page number from pagination metadata.
    pub fn next_page(&self) -> Option<u32> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.pagination.as_ref())
            .and_then(|pagination| pagination.next_page)
    }
}

/// Parse and normalize one resource object from a raw JSON value.
///
/// Normalization runs over the whole record so relationship names and nested
/// attribute objects come out camelCase as well.
pub fn resource_from_value(value: Value) -> serde_json::Result<ResourceObject> {
    serde_json::from_value(normalize_keys(value))
}
