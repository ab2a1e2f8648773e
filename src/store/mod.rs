//! In-memory identity store.
//!
//! Records are grouped into one table per model. Ids are assigned per model as
//! `"1"`, `"2"`, ... and are never reused, even after a record is deleted.
//! Relationship links live on the records themselves and are maintained by the
//! graph operations in [`graph`].

mod graph;
mod record;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::{MockError, Result};
use crate::schema::{Cardinality, Schema};

pub use graph::Related;
pub use record::{Attributes, Linkage, Record, RecordKey};

/// Records of one model, keyed by numeric id so iteration follows creation order.
#[derive(Debug, Default)]
struct Table {
    next_id: u64,
    records: BTreeMap<u64, Record>,
}

/// The identity store.
#[derive(Debug)]
pub struct Store {
    schema: Arc<Schema>,
    tables: BTreeMap<String, Table>,
}

impl Store {
    /// Create an empty store for the given schema.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            tables: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn schema_arc(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    /// Insert a new record, assigning the next id for its model.
    ///
    /// Every declared relationship starts out empty.
    pub fn create_record(&mut self, model: &str, attributes: Attributes) -> Result<Record> {
        let def = self.schema.get(model)?;
        let relationships = def
            .relationships
            .iter()
            .map(|r| {
                let linkage = match r.cardinality {
                    Cardinality::One => Linkage::One(None),
                    Cardinality::Many => Linkage::Many(Vec::new()),
                };
                (r.name.clone(), linkage)
            })
            .collect();

        let table = self.tables.entry(model.to_string()).or_default();
        table.next_id += 1;
        let id = table.next_id;

        let record = Record {
            model: model.to_string(),
            id: id.to_string(),
            attributes,
            relationships,
        };
        table.records.insert(id, record.clone());

        tracing::trace!(model, id, "created record");
        Ok(record)
    }

    /// Find a record by model and id.
    pub fn find(&self, model: &str, id: &str) -> Result<&Record> {
        self.schema.get(model)?;
        id.parse::<u64>()
            .ok()
            .and_then(|n| self.tables.get(model)?.records.get(&n))
            .ok_or_else(|| MockError::RecordNotFound {
                model: model.to_string(),
                id: id.to_string(),
            })
    }

    /// Find a record by key.
    pub fn get(&self, key: &RecordKey) -> Result<&Record> {
        self.find(&key.model, &key.id)
    }

    pub(crate) fn get_mut(&mut self, key: &RecordKey) -> Result<&mut Record> {
        key.id
            .parse::<u64>()
            .ok()
            .and_then(|n| self.tables.get_mut(&key.model)?.records.get_mut(&n))
            .ok_or_else(|| MockError::RecordNotFound {
                model: key.model.clone(),
                id: key.id.clone(),
            })
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        self.get(key).is_ok()
    }

    /// All live records of a model, in creation order.
    pub fn all(&self, model: &str) -> Result<Vec<&Record>> {
        self.schema.get(model)?;
        Ok(self
            .tables
            .get(model)
            .map(|t| t.records.values().collect())
            .unwrap_or_default())
    }

    /// Records of a model whose attributes equal every given value.
    ///
    /// String filters also match numbers and booleans by their string form, so
    /// query-string filters work against non-string attributes.
    pub fn where_eq(&self, model: &str, filters: &[(String, String)]) -> Result<Vec<&Record>> {
        Ok(self
            .all(model)?
            .into_iter()
            .filter(|record| {
                filters.iter().all(|(name, expected)| match record.attr(name) {
                    Some(Value::String(s)) => s == expected,
                    Some(Value::Null) | None => false,
                    Some(other) => other.to_string() == *expected,
                })
            })
            .collect())
    }

    /// Merge attributes into an existing record.
    pub fn update_attributes(&mut self, key: &RecordKey, attributes: Attributes) -> Result<&Record> {
        let record = self.get_mut(key)?;
        for (name, value) in attributes {
            record.attributes.insert(name, value);
        }
        Ok(record)
    }

    /// Remove a record and sever every relationship that points to it.
    pub fn delete(&mut self, model: &str, id: &str) -> Result<Record> {
        let n = self.find(model, id)?.id.parse::<u64>().unwrap_or_default();
        let record = self
            .tables
            .get_mut(model)
            .and_then(|t| t.records.remove(&n))
            .ok_or_else(|| MockError::RecordNotFound {
                model: model.to_string(),
                id: id.to_string(),
            })?;

        let schema = self.schema.clone();
        for (table_model, table) in self.tables.iter_mut() {
            let Ok(def) = schema.get(table_model) else {
                continue;
            };
            let pointing: Vec<&str> = def
                .relationships
                .iter()
                .filter(|r| r.model == model)
                .map(|r| r.name.as_str())
                .collect();
            if pointing.is_empty() {
                continue;
            }
            for other in table.records.values_mut() {
                for name in &pointing {
                    if let Some(linkage) = other.relationships.get_mut(*name) {
                        linkage.detach(&record.id);
                    }
                }
            }
        }

        tracing::trace!(model, id, "deleted record");
        Ok(record)
    }

    /// Number of records ever created for a model in this store's lifetime,
    /// including deleted ones.
    pub fn created_count(&self, model: &str) -> usize {
        self.tables
            .get(model)
            .map(|t| t.next_id as usize)
            .unwrap_or(0)
    }

    /// Number of live records across all models.
    pub fn len(&self) -> usize {
        self.tables.values().map(|t| t.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every record and reset id counters.
    pub fn clear(&mut self) {
        self.tables.clear();
    }

    /// Snapshot of the whole store as JSON, keyed by model plural.
    pub fn dump(&self) -> Value {
        let mut out = serde_json::Map::new();
        for def in self.schema.models() {
            let records: Vec<Value> = self
                .tables
                .get(&def.name)
                .map(|t| {
                    t.records
                        .values()
                        .map(|r| {
                            json!({
                                "id": r.id,
                                "attributes": r.attributes,
                                "relationships": r.relationships,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            out.insert(def.plural.clone(), Value::Array(records));
        }
        Value::Object(out)
    }
}
