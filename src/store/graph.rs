//! Relationship graph operations.
//!
//! A link is always written to both sides in the same call when the relationship
//! has an inverse. Replacing a has-one value detaches the previous target from
//! its inverse before the new link is made.

use super::{Record, RecordKey, Store};
use crate::error::{MockError, Result};
use crate::schema::RelationshipDef;

/// The value of a relationship read from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Related<'a> {
    /// Has-one; `None` when unset.
    One(Option<&'a Record>),
    /// Has-many, in link order.
    Many(Vec<&'a Record>),
}

impl<'a> Related<'a> {
    /// The related records as a list, whatever the cardinality.
    pub fn records(&self) -> Vec<&'a Record> {
        match self {
            Related::One(record) => record.iter().copied().collect(),
            Related::Many(records) => records.clone(),
        }
    }
}

impl Store {
    /// Link `target` to `owner` through `relationship`, updating the inverse side.
    pub fn link(&mut self, owner: &RecordKey, relationship: &str, target: &RecordKey) -> Result<()> {
        let (def, inverse) = self.checked_relationship(owner, relationship, target)?;

        let current = self.get(owner)?.relationships.get(relationship).cloned();
        if current.as_ref().is_some_and(|l| l.contains(&target.id)) {
            return Ok(());
        }
        if !def.is_many() {
            if let Some(previous) = current.as_ref().and_then(|l| l.ids().first().map(|s| s.to_string())) {
                self.unlink(owner, relationship, &RecordKey::new(&def.model, &previous))?;
            }
        }

        if let Some(inverse) = &inverse {
            if !inverse.is_many() {
                let previous_owner = self
                    .get(target)?
                    .related_id(&inverse.name)
                    .map(str::to_string);
                if let Some(previous_owner) = previous_owner {
                    self.unlink(
                        target,
                        &inverse.name,
                        &RecordKey::new(&owner.model, &previous_owner),
                    )?;
                }
            }
        }

        self.attach(owner, relationship, &target.id)?;
        if let Some(inverse) = &inverse {
            self.attach(target, &inverse.name, &owner.id)?;
        }

        tracing::trace!(%owner, relationship, %target, "linked records");
        Ok(())
    }

    /// Remove the link between `owner` and `target`, on both sides.
    ///
    /// Unlinking records that are not linked is a no-op.
    pub fn unlink(&mut self, owner: &RecordKey, relationship: &str, target: &RecordKey) -> Result<()> {
        let def = self.store_relationship(owner, relationship)?;
        if def.model != target.model {
            return Err(type_mismatch(owner, &def, target));
        }
        let inverse = self
            .schema
            .inverse_of(&owner.model, relationship)
            .map(|r| r.name.clone());

        self.detach(owner, relationship, &target.id)?;
        if let Some(inverse) = inverse {
            if self.contains(target) {
                self.detach(target, &inverse, &owner.id)?;
            }
        }

        tracing::trace!(%owner, relationship, %target, "unlinked records");
        Ok(())
    }

    /// Replace the whole value of a relationship.
    ///
    /// For has-one, `targets` holds at most one key; an empty slice clears it.
    /// For has-many, the final link order follows `targets`.
    pub fn set_relationship(
        &mut self,
        owner: &RecordKey,
        relationship: &str,
        targets: &[RecordKey],
    ) -> Result<()> {
        let def = self.store_relationship(owner, relationship)?;
        if !def.is_many() && targets.len() > 1 {
            return Err(MockError::TypeMismatch {
                model: owner.model.clone(),
                relationship: relationship.to_string(),
                expected: format!("a single {}", def.model),
                actual: format!("{} records", targets.len()),
            });
        }
        for target in targets {
            self.checked_relationship(owner, relationship, target)?;
        }

        let current: Vec<String> = self
            .get(owner)?
            .related_ids(relationship)
            .into_iter()
            .map(str::to_string)
            .collect();
        for id in current {
            self.unlink(owner, relationship, &RecordKey::new(&def.model, &id))?;
        }
        for target in targets {
            self.link(owner, relationship, target)?;
        }
        Ok(())
    }

    /// Read a relationship.
    pub fn related(&self, owner: &RecordKey, relationship: &str) -> Result<Related<'_>> {
        let def = self.store_relationship(owner, relationship)?;
        let record = self.get(owner)?;
        let ids = record.related_ids(relationship);

        if def.is_many() {
            let records = ids
                .into_iter()
                .filter_map(|id| self.find(&def.model, id).ok())
                .collect();
            Ok(Related::Many(records))
        } else {
            let related = ids
                .first()
                .and_then(|id| self.find(&def.model, id).ok());
            Ok(Related::One(related))
        }
    }

    fn store_relationship(&self, owner: &RecordKey, relationship: &str) -> Result<RelationshipDef> {
        self.schema
            .relationship(&owner.model, relationship)
            .cloned()
    }

    /// Validate a link before any side is mutated.
    fn checked_relationship(
        &self,
        owner: &RecordKey,
        relationship: &str,
        target: &RecordKey,
    ) -> Result<(RelationshipDef, Option<RelationshipDef>)> {
        let def = self.store_relationship(owner, relationship)?;
        if def.model != target.model {
            return Err(type_mismatch(owner, &def, target));
        }
        self.get(owner)?;
        self.get(target)?;
        let inverse = self
            .schema
            .inverse_of(&owner.model, relationship)
            .cloned();
        Ok((def, inverse))
    }

    fn attach(&mut self, owner: &RecordKey, relationship: &str, id: &str) -> Result<()> {
        if let Some(linkage) = self.get_mut(owner)?.relationships.get_mut(relationship) {
            linkage.attach(id);
        }
        Ok(())
    }

    fn detach(&mut self, owner: &RecordKey, relationship: &str, id: &str) -> Result<()> {
        if let Some(linkage) = self.get_mut(owner)?.relationships.get_mut(relationship) {
            linkage.detach(id);
        }
        Ok(())
    }
}

fn type_mismatch(owner: &RecordKey, def: &RelationshipDef, target: &RecordKey) -> MockError {
    MockError::TypeMismatch {
        model: owner.model.clone(),
        relationship: def.name.clone(),
        expected: def.model.clone(),
        actual: target.model.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::schema::{ModelDef, Schema};
    use crate::store::Attributes;

    fn store() -> Store {
        let schema = Schema::new()
            .model(ModelDef::new("folder").has_many("documents", "document"))
            .model(ModelDef::new("document").belongs_to("folder", "folder"))
            .model(ModelDef::new("user").belongs_to("profile", "profile"))
            .model(ModelDef::new("profile").belongs_to("user", "user"));
        Store::new(Arc::new(schema))
    }

    fn create(store: &mut Store, model: &str) -> RecordKey {
        store.create_record(model, Attributes::new()).unwrap().key()
    }

    #[test]
    fn test_link_from_many_side_updates_inverse() {
        let mut store = store();
        let folder = create(&mut store, "folder");
        let doc = create(&mut store, "document");

        store.link(&folder, "documents", &doc).unwrap();

        assert_eq!(store.get(&folder).unwrap().related_ids("documents"), vec!["1"]);
        assert_eq!(store.get(&doc).unwrap().related_id("folder"), Some("1"));
    }

    #[test]
    fn test_link_from_one_side_updates_inverse() {
        let mut store = store();
        let folder = create(&mut store, "folder");
        let doc = create(&mut store, "document");

        store.link(&doc, "folder", &folder).unwrap();

        assert_eq!(store.get(&folder).unwrap().related_ids("documents"), vec!["1"]);
    }

    #[test]
    fn test_replacing_has_one_detaches_previous() {
        let mut store = store();
        let notes = create(&mut store, "folder");
        let drafts = create(&mut store, "folder");
        let doc = create(&mut store, "document");

        store.link(&doc, "folder", &notes).unwrap();
        store.link(&drafts, "documents", &doc).unwrap();

        assert!(store.get(&notes).unwrap().related_ids("documents").is_empty());
        assert_eq!(store.get(&drafts).unwrap().related_ids("documents"), vec!["1"]);
        assert_eq!(store.get(&doc).unwrap().related_id("folder"), Some("2"));
    }

    #[test]
    fn test_one_to_one_replacement_keeps_both_sides_consistent() {
        let mut store = store();
        let alice = create(&mut store, "user");
        let bob = create(&mut store, "user");
        let profile = create(&mut store, "profile");

        store.link(&alice, "profile", &profile).unwrap();
        store.link(&profile, "user", &bob).unwrap();

        assert_eq!(store.get(&alice).unwrap().related_id("profile"), None);
        assert_eq!(store.get(&bob).unwrap().related_id("profile"), Some("1"));
    }

    #[test]
    fn test_has_many_reads_in_link_order() {
        let mut store = store();
        let folder = create(&mut store, "folder");
        let first = create(&mut store, "document");
        let second = create(&mut store, "document");

        store.link(&folder, "documents", &second).unwrap();
        store.link(&folder, "documents", &first).unwrap();

        let ids: Vec<_> = store
            .related(&folder, "documents")
            .unwrap()
            .records()
            .iter()
            .map(|r| r.id.clone())
            .collect();
        assert_eq!(ids, ["2", "1"]);
    }

    #[test]
    fn test_unset_has_one_reads_as_absent() {
        let mut store = store();
        let doc = create(&mut store, "document");

        assert_eq!(store.related(&doc, "folder").unwrap(), Related::One(None));
    }

    #[test]
    fn test_unlink_is_symmetric() {
        let mut store = store();
        let folder = create(&mut store, "folder");
        let doc = create(&mut store, "document");
        store.link(&folder, "documents", &doc).unwrap();

        store.unlink(&doc, "folder", &folder).unwrap();

        assert!(store.get(&folder).unwrap().related_ids("documents").is_empty());
        assert_eq!(store.get(&doc).unwrap().related_id("folder"), None);
    }

    #[test]
    fn test_delete_severs_inverse_references() {
        let mut store = store();
        let folder = create(&mut store, "folder");
        let doc = create(&mut store, "document");
        store.link(&folder, "documents", &doc).unwrap();

        store.delete("folder", &folder.id).unwrap();

        assert_eq!(store.related(&doc, "folder").unwrap(), Related::One(None));
    }

    #[test]
    fn test_link_rejects_wrong_model() {
        let mut store = store();
        let folder = create(&mut store, "folder");
        let other = create(&mut store, "folder");

        let err = store.link(&folder, "documents", &other).unwrap_err();
        assert!(matches!(err, MockError::TypeMismatch { .. }));
        assert!(store.get(&folder).unwrap().related_ids("documents").is_empty());
    }

    #[test]
    fn test_set_relationship_replaces_in_given_order() {
        let mut store = store();
        let folder = create(&mut store, "folder");
        let a = create(&mut store, "document");
        let b = create(&mut store, "document");
        let c = create(&mut store, "document");
        store.link(&folder, "documents", &a).unwrap();

        store
            .set_relationship(&folder, "documents", &[c.clone(), b.clone()])
            .unwrap();

        assert_eq!(store.get(&folder).unwrap().related_ids("documents"), vec!["3", "2"]);
        assert_eq!(store.get(&a).unwrap().related_id("folder"), None);
        assert_eq!(store.get(&c).unwrap().related_id("folder"), Some("1"));
    }
}
