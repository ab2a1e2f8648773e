//! Attribute overrides passed to `create`.
//!
//! An override is either a plain JSON value, which becomes an attribute, or one
//! or more records, which become a relationship assignment.

use serde_json::Value;

use crate::error::{MockError, Result};
use crate::schema::{ModelDef, RelationshipDef};
use crate::store::{Attributes, Record, RecordKey};

/// A single override value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Value(Value),
    Record(RecordKey),
    Records(Vec<RecordKey>),
}

impl From<Value> for AttrValue {
    fn from(value: Value) -> Self {
        AttrValue::Value(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Value(Value::from(value))
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Value(Value::from(value))
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Value(Value::from(value))
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Value(Value::from(value))
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Value(Value::from(value))
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Value(Value::from(value))
    }
}

impl From<RecordKey> for AttrValue {
    fn from(key: RecordKey) -> Self {
        AttrValue::Record(key)
    }
}

impl From<&Record> for AttrValue {
    fn from(record: &Record) -> Self {
        AttrValue::Record(record.key())
    }
}

impl From<Record> for AttrValue {
    fn from(record: Record) -> Self {
        AttrValue::Record(record.key())
    }
}

impl From<Vec<RecordKey>> for AttrValue {
    fn from(keys: Vec<RecordKey>) -> Self {
        AttrValue::Records(keys)
    }
}

impl From<Vec<Record>> for AttrValue {
    fn from(records: Vec<Record>) -> Self {
        AttrValue::Records(records.iter().map(Record::key).collect())
    }
}

impl From<&[Record]> for AttrValue {
    fn from(records: &[Record]) -> Self {
        AttrValue::Records(records.iter().map(Record::key).collect())
    }
}

/// Ordered overrides for a record being created or updated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attrs(Vec<(String, AttrValue)>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing an earlier one with the same name.
    pub fn with(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.set(name, value.into());
        self
    }

    pub fn set(&mut self, name: &str, value: AttrValue) {
        match self.0.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((name.to_string(), value)),
        }
    }

    /// Plain attributes from a JSON object. Anything else yields no attributes.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(
                map.into_iter()
                    .map(|(k, v)| (k, AttrValue::Value(v)))
                    .collect(),
            ),
            _ => Self::default(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, AttrValue)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Separate plain attributes from relationship assignments for `model`.
    ///
    /// Record values must name a declared relationship. Plain values are treated
    /// as assignments when they use a relationship name with `null`, or a
    /// foreign-key name (`folderId`, `documentIds`). Any other plain value under
    /// a relationship name is rejected.
    pub fn split(self, model: &ModelDef) -> Result<(Attributes, Vec<(String, Vec<RecordKey>)>)> {
        let mut attributes = Attributes::new();
        let mut assignments = Vec::new();

        for (name, value) in self.0 {
            match value {
                AttrValue::Record(key) => {
                    let def = relationship(model, &name)?;
                    assignments.push((def.name.clone(), vec![key]));
                }
                AttrValue::Records(keys) => {
                    let def = relationship(model, &name)?;
                    assignments.push((def.name.clone(), keys));
                }
                AttrValue::Value(Value::Null) if model.get_relationship(&name).is_some() => {
                    assignments.push((name, Vec::new()));
                }
                AttrValue::Value(value) if model.get_relationship(&name).is_some() => {
                    return Err(MockError::MalformedBody(format!(
                        "'{name}' is a relationship of {}; assign records, null, or ids through its foreign key, got {value}",
                        model.name
                    )));
                }
                AttrValue::Value(value) => match foreign_key(model, &name) {
                    Some(def) => {
                        let ids = foreign_key_ids(&name, &value)?;
                        let keys = ids.iter().map(|id| RecordKey::new(&def.model, id)).collect();
                        assignments.push((def.name.clone(), keys));
                    }
                    None => {
                        attributes.insert(name, value);
                    }
                },
            }
        }

        Ok((attributes, assignments))
    }
}

impl From<Value> for Attrs {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}

fn relationship<'a>(model: &'a ModelDef, name: &str) -> Result<&'a RelationshipDef> {
    model
        .get_relationship(name)
        .ok_or_else(|| MockError::UnknownRelationship {
            model: model.name.clone(),
            relationship: name.to_string(),
        })
}

/// `folderId` for has-one `folder`, `documentIds` for has-many `documents`.
fn foreign_key<'a>(model: &'a ModelDef, name: &str) -> Option<&'a RelationshipDef> {
    model.relationships.iter().find(|r| {
        if r.is_many() {
            let singular = r.name.strip_suffix('s').unwrap_or(&r.name);
            name == format!("{singular}Ids")
        } else {
            name == format!("{}Id", r.name)
        }
    })
}

fn foreign_key_ids(name: &str, value: &Value) -> Result<Vec<String>> {
    let id = |v: &Value| match v {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(MockError::MalformedBody(format!(
            "'{name}' must hold ids, got {other}"
        ))),
    };
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.iter().map(id).collect(),
        single => Ok(vec![id(single)?]),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn document() -> ModelDef {
        ModelDef::new("document")
            .belongs_to("folder", "folder")
            .has_many("tags", "tag")
    }

    #[test]
    fn test_with_replaces_existing_value() {
        let attrs = Attrs::new().with("title", "a").with("title", "b");

        assert_eq!(attrs.get("title"), Some(&AttrValue::from("b")));
        assert_eq!(attrs.iter().count(), 1);
    }

    #[test]
    fn test_split_separates_records_from_attributes() {
        let folder = RecordKey::new("folder", "1");
        let attrs = Attrs::new().with("title", "Hello").with("folder", folder.clone());

        let (attributes, assignments) = attrs.split(&document()).unwrap();

        assert_eq!(attributes, json!({ "title": "Hello" }).as_object().cloned().unwrap());
        assert_eq!(assignments, vec![("folder".to_string(), vec![folder])]);
    }

    #[test]
    fn test_split_reads_foreign_keys() {
        let attrs = Attrs::from_json(json!({ "folderId": 2, "tagIds": ["1", "3"] }));

        let (attributes, assignments) = attrs.split(&document()).unwrap();

        assert!(attributes.is_empty());
        assert_eq!(assignments[0], ("folder".to_string(), vec![RecordKey::new("folder", "2")]));
        assert_eq!(
            assignments[1],
            (
                "tags".to_string(),
                vec![RecordKey::new("tag", "1"), RecordKey::new("tag", "3")]
            )
        );
    }

    #[test]
    fn test_split_rejects_plain_value_under_relationship_name() {
        let attrs = Attrs::from_json(json!({ "title": "x", "folder": "1" }));

        assert!(matches!(
            attrs.split(&document()),
            Err(MockError::MalformedBody(_))
        ));
    }

    #[test]
    fn test_split_rejects_records_on_unknown_relationship() {
        let attrs = Attrs::new().with("owner", RecordKey::new("user", "1"));

        assert!(matches!(
            attrs.split(&document()),
            Err(MockError::UnknownRelationship { .. })
        ));
    }
}
