//! Record types held by the store.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Attribute values of a record, in insertion order.
pub type Attributes = serde_json::Map<String, Value>;

/// Identity of a record: its model name and id.
///
/// Keys are how records refer to each other and how callers hold on to records
/// between store operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordKey {
    pub model: String,
    pub id: String,
}

impl RecordKey {
    pub fn new(model: &str, id: &str) -> Self {
        Self {
            model: model.to_string(),
            id: id.to_string(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.model, self.id)
    }
}

/// Stored side of one relationship: ids of records of the target model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Linkage {
    One(Option<String>),
    Many(Vec<String>),
}

impl Linkage {
    /// Target ids in link order.
    pub fn ids(&self) -> Vec<&str> {
        match self {
            Linkage::One(id) => id.iter().map(String::as_str).collect(),
            Linkage::Many(ids) => ids.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        match self {
            Linkage::One(current) => current.as_deref() == Some(id),
            Linkage::Many(ids) => ids.iter().any(|i| i == id),
        }
    }

    pub(crate) fn attach(&mut self, id: &str) {
        match self {
            Linkage::One(current) => *current = Some(id.to_string()),
            Linkage::Many(ids) => {
                if !ids.iter().any(|i| i == id) {
                    ids.push(id.to_string());
                }
            }
        }
    }

    pub(crate) fn detach(&mut self, id: &str) {
        match self {
            Linkage::One(current) => {
                if current.as_deref() == Some(id) {
                    *current = None;
                }
            }
            Linkage::Many(ids) => ids.retain(|i| i != id),
        }
    }
}

/// A typed entity in the store.
///
/// Records handed out by the store are snapshots; use [`Record::key`] to refer
/// back to the live record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub model: String,
    pub id: String,
    pub attributes: Attributes,
    pub relationships: BTreeMap<String, Linkage>,
}

impl Record {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.model, &self.id)
    }

    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Attribute value as a string slice.
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    /// Linked id for a has-one relationship.
    pub fn related_id(&self, relationship: &str) -> Option<&str> {
        match self.relationships.get(relationship) {
            Some(Linkage::One(id)) => id.as_deref(),
            _ => None,
        }
    }

    /// Linked ids for a has-many relationship.
    pub fn related_ids(&self, relationship: &str) -> Vec<&str> {
        self.relationships
            .get(relationship)
            .map(Linkage::ids)
            .unwrap_or_default()
    }
}

impl From<&Record> for RecordKey {
    fn from(record: &Record) -> Self {
        record.key()
    }
}
