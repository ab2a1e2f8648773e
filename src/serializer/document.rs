//! JSON:API document types.
//!
//! These are the shapes the serializer produces. They also deserialize, so
//! tests and clients can parse responses back into typed values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::store::Attributes;

/// A top-level JSON:API document.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub data: PrimaryData,
    pub included: Option<Vec<ResourceObject>>,
}

impl Document {
    /// Primary resources as a list, whatever the shape of `data`.
    pub fn resources(&self) -> Vec<&ResourceObject> {
        match &self.data {
            PrimaryData::Many(resources) => resources.iter().collect(),
            PrimaryData::One(resource) => resource.iter().collect(),
        }
    }

    /// Included resources, empty when the document has none.
    pub fn included(&self) -> &[ResourceObject] {
        self.included.as_deref().unwrap_or_default()
    }

    /// Find an included resource by type and id.
    pub fn find_included(&self, type_name: &str, id: &str) -> Option<&ResourceObject> {
        self.included()
            .iter()
            .find(|r| r.type_name == type_name && r.id == id)
    }
}

/// `data` member: a single resource (possibly null) or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryData {
    Many(Vec<ResourceObject>),
    One(Option<ResourceObject>),
}

/// A rendered record.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceObject {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub attributes: Attributes,
    pub relationships: Option<BTreeMap<String, RelationshipObject>>,
}

impl ResourceObject {
    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier {
            type_name: self.type_name.clone(),
            id: self.id.clone(),
        }
    }
}

/// Relationship linkage rendered on a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipObject {
    pub data: ResourceLinkage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceLinkage {
    Many(Vec<ResourceIdentifier>),
    One(Option<ResourceIdentifier>),
}

/// `{ type, id }` reference to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub type_name: String,
    pub id: String,
}

impl ResourceIdentifier {
    pub fn new(type_name: &str, id: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            id: id.to_string(),
        }
    }
}
