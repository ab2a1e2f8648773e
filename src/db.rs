//! Store plus factories: the object graph handlers and tests work against.

use std::sync::Arc;

use crate::error::{MockError, Result};
use crate::factory::{Attrs, Factories};
use crate::schema::Schema;
use crate::store::{Attributes, Record, RecordKey, Related, Store};

/// The mock server's database.
///
/// Wraps the identity store and adds factory-driven creation. Custom route
/// handlers and factory hooks receive `&mut Db`.
#[derive(Debug)]
pub struct Db {
    store: Store,
    factories: Arc<Factories>,
}

impl Db {
    pub fn new(schema: Arc<Schema>, factories: Arc<Factories>) -> Self {
        Self {
            store: Store::new(schema),
            factories,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn schema(&self) -> &Schema {
        self.store.schema()
    }

    /// Create one record of `model` from its factory.
    ///
    /// Traits are applied in order, then `attrs`. Record-valued attributes and
    /// foreign keys become links instead of attributes. After-create hooks run last.
    pub fn create(&mut self, model: &str, traits: &[&str], attrs: Attrs) -> Result<Record> {
        let schema = self.store.schema_arc();
        let (overrides, assignments) = attrs.split(schema.get(model)?)?;
        self.check_assignments(model, &assignments)?;

        let index = self.store.created_count(model);
        let factories = self.factories.clone();
        let (attributes, hooks) = match factories.get(model) {
            Some(factory) => (
                factory.build(model, index, traits, &overrides)?,
                factory.hooks(model, traits)?,
            ),
            None => {
                if let Some(name) = traits.first() {
                    return Err(MockError::UnknownTrait {
                        model: model.to_string(),
                        trait_name: name.to_string(),
                    });
                }
                (overrides, Vec::new())
            }
        };

        let key = self.persist(model, attributes, &assignments)?;
        if !hooks.is_empty() {
            let record = self.store.get(&key)?.clone();
            for hook in hooks {
                hook(&record, self)?;
            }
        }

        self.store.get(&key).cloned()
    }

    /// Create a record from exactly the given attributes, bypassing factories.
    pub fn insert(&mut self, model: &str, attrs: Attrs) -> Result<Record> {
        let schema = self.store.schema_arc();
        let (attributes, assignments) = attrs.split(schema.get(model)?)?;
        self.check_assignments(model, &assignments)?;

        let key = self.persist(model, attributes, &assignments)?;
        self.store.get(&key).cloned()
    }

    /// Merge attributes into a record and replace any relationships given.
    pub fn update(&mut self, key: &RecordKey, attrs: Attrs) -> Result<Record> {
        let schema = self.store.schema_arc();
        let (attributes, assignments) = attrs.split(schema.get(&key.model)?)?;
        self.store.get(key)?;
        self.check_assignments(&key.model, &assignments)?;

        self.store.update_attributes(key, attributes)?;
        for (relationship, targets) in &assignments {
            self.store.set_relationship(key, relationship, targets)?;
        }
        self.store.get(key).cloned()
    }

    /// Delete a record, severing links to it.
    pub fn delete(&mut self, model: &str, id: &str) -> Result<Record> {
        self.store.delete(model, id)
    }

    /// Create `count` records, returned in creation order.
    pub fn create_list(
        &mut self,
        model: &str,
        count: usize,
        traits: &[&str],
        attrs: Attrs,
    ) -> Result<Vec<Record>> {
        (0..count)
            .map(|_| self.create(model, traits, attrs.clone()))
            .collect()
    }

    /// Create a record of the relationship's target model and link it to `owner`.
    pub fn create_related(
        &mut self,
        owner: &RecordKey,
        relationship: &str,
        attrs: Attrs,
    ) -> Result<Record> {
        let target_model = self
            .schema()
            .relationship(&owner.model, relationship)?
            .model
            .clone();
        self.store.get(owner)?;

        let created = self.create(&target_model, &[], attrs)?;
        self.store.link(owner, relationship, &created.key())?;
        self.store.get(&created.key()).cloned()
    }

    /// Read a relationship of `owner`.
    pub fn related(&self, owner: &RecordKey, relationship: &str) -> Result<Related<'_>> {
        self.store.related(owner, relationship)
    }

    pub fn find(&self, model: &str, id: &str) -> Result<Record> {
        self.store.find(model, id).cloned()
    }

    pub fn all(&self, model: &str) -> Result<Vec<Record>> {
        Ok(self.store.all(model)?.into_iter().cloned().collect())
    }

    /// Reject assignments to missing records or the wrong model before anything is written.
    fn check_assignments(&self, model: &str, assignments: &[(String, Vec<RecordKey>)]) -> Result<()> {
        for (relationship, targets) in assignments {
            let rel = self.schema().relationship(model, relationship)?;
            if !rel.is_many() && targets.len() > 1 {
                return Err(MockError::TypeMismatch {
                    model: model.to_string(),
                    relationship: relationship.clone(),
                    expected: format!("a single {}", rel.model),
                    actual: format!("{} records", targets.len()),
                });
            }
            for target in targets {
                if target.model != rel.model {
                    return Err(MockError::TypeMismatch {
                        model: model.to_string(),
                        relationship: relationship.clone(),
                        expected: rel.model.clone(),
                        actual: target.model.clone(),
                    });
                }
                self.store.get(target)?;
            }
        }
        Ok(())
    }

    fn persist(
        &mut self,
        model: &str,
        attributes: Attributes,
        assignments: &[(String, Vec<RecordKey>)],
    ) -> Result<RecordKey> {
        let key = self.store.create_record(model, attributes)?.key();
        for (relationship, targets) in assignments {
            self.store.set_relationship(&key, relationship, targets)?;
        }
        Ok(key)
    }

    /// Empty the store and reset id counters. Factories are kept.
    pub fn reset(&mut self) {
        self.store.clear();
    }
}
