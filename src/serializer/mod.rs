//! Store records to JSON:API documents.
//!
//! Every declared relationship is rendered as linkage on its resource. Related
//! records are embedded in `included` when a model auto-includes them or the
//! request asks for them with `include=`. Auto-includes are resolved first;
//! both feed the same de-duplicated list, which never repeats a primary record.

mod document;

use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::error::Result;
use crate::schema::Cardinality;
use crate::store::{Record, RecordKey, Store};

pub use document::{
    Document, PrimaryData, RelationshipObject, ResourceIdentifier, ResourceLinkage, ResourceObject,
};

/// Read-only view of a store that renders documents.
pub struct Serializer<'a> {
    store: &'a Store,
}

/// Bookkeeping for one include resolution.
#[derive(Default)]
struct IncludeState {
    seen: HashSet<RecordKey>,
    included: Vec<RecordKey>,
    auto_expanded: HashSet<RecordKey>,
}

impl<'a> Serializer<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Render a single record as primary data.
    pub fn serialize_record(&self, key: &RecordKey, includes: &[String]) -> Result<Document> {
        let record = self.store.get(key)?;
        let included = self.resolve_included(&[key.clone()], includes)?;
        Ok(Document {
            data: PrimaryData::One(Some(self.resource(record)?)),
            included,
        })
    }

    /// Render records of one model as a list.
    pub fn serialize_collection(&self, keys: &[RecordKey], includes: &[String]) -> Result<Document> {
        let resources = keys
            .iter()
            .map(|key| self.store.get(key).and_then(|r| self.resource(r)))
            .collect::<Result<Vec<_>>>()?;
        let included = self.resolve_included(keys, includes)?;
        Ok(Document {
            data: PrimaryData::Many(resources),
            included,
        })
    }

    /// Check that every include path resolves from `model`, without reading records.
    pub fn check_includes(&self, model: &str, includes: &[String]) -> Result<()> {
        let schema = self.store.schema();
        for path in includes {
            let mut current = model;
            for segment in path.split('.').filter(|s| !s.is_empty()) {
                current = &schema.relationship(current, segment)?.model;
            }
        }
        Ok(())
    }

    /// Render a record without includes.
    pub fn resource(&self, record: &Record) -> Result<ResourceObject> {
        let schema = self.store.schema();
        let def = schema.get(&record.model)?;

        let attributes = match &def.serializer.attrs {
            Some(allowed) => record
                .attributes
                .iter()
                .filter(|(name, _)| allowed.contains(*name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            None => record.attributes.clone(),
        };

        let mut relationships = BTreeMap::new();
        for rel in &def.relationships {
            let target_type = &schema.get(&rel.model)?.plural;
            let ids = record.related_ids(&rel.name);
            let data = match rel.cardinality {
                Cardinality::One => ResourceLinkage::One(
                    ids.first().map(|id| ResourceIdentifier::new(target_type, id)),
                ),
                Cardinality::Many => ResourceLinkage::Many(
                    ids.iter()
                        .map(|id| ResourceIdentifier::new(target_type, id))
                        .collect(),
                ),
            };
            relationships.insert(rel.name.clone(), RelationshipObject { data });
        }

        Ok(ResourceObject {
            id: record.id.clone(),
            type_name: def.plural.clone(),
            attributes,
            relationships: (!relationships.is_empty()).then_some(relationships),
        })
    }

    fn resolve_included(
        &self,
        primaries: &[RecordKey],
        requested: &[String],
    ) -> Result<Option<Vec<ResourceObject>>> {
        let mut state = IncludeState {
            seen: primaries.iter().cloned().collect(),
            ..Default::default()
        };

        self.expand_auto(primaries.iter().cloned().collect(), &mut state)?;
        for path in requested {
            self.walk(primaries, path, &mut state)?;
        }
        let pending = state.included.iter().cloned().collect();
        self.expand_auto(pending, &mut state)?;

        if state.included.is_empty() {
            return Ok(None);
        }
        state
            .included
            .iter()
            .map(|key| self.store.get(key).and_then(|r| self.resource(r)))
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// Apply each record's auto-includes, then those of whatever they pulled in.
    fn expand_auto(&self, mut queue: VecDeque<RecordKey>, state: &mut IncludeState) -> Result<()> {
        while let Some(key) = queue.pop_front() {
            if !state.auto_expanded.insert(key.clone()) {
                continue;
            }
            let def = self.store.schema().get(&key.model)?;
            for path in &def.serializer.include {
                let added = self.walk(std::slice::from_ref(&key), path, state)?;
                queue.extend(added);
            }
        }
        Ok(())
    }

    /// Follow a dotted include path breadth-first from `start`, returning records
    /// added to `included` by this walk.
    fn walk(&self, start: &[RecordKey], path: &str, state: &mut IncludeState) -> Result<Vec<RecordKey>> {
        let mut level: Vec<RecordKey> = start.to_vec();
        let mut added = Vec::new();

        for segment in path.split('.').filter(|s| !s.is_empty()) {
            let mut next: Vec<RecordKey> = Vec::new();
            for key in &level {
                let record = self.store.get(key)?;
                let rel = self.store.schema().relationship(&record.model, segment)?;
                for id in record.related_ids(segment) {
                    let related = RecordKey::new(&rel.model, id);
                    if !self.store.contains(&related) || next.contains(&related) {
                        continue;
                    }
                    if state.seen.insert(related.clone()) {
                        state.included.push(related.clone());
                        added.push(related.clone());
                    }
                    next.push(related);
                }
            }
            level = next;
        }

        Ok(added)
    }
}
