//! Factories: declarative templates for synthesizing records.
//!
//! A [`Factory`] lists attribute generators in declaration order. Generators are
//! plain function pointers, so they cannot capture external mutable state:
//!
//! - [`Generator::Constant`] - the same value every time
//! - [`Generator::Sequence`] - computed from the record's 0-based creation index
//! - [`Generator::Dependent`] - computed from sibling attributes generated earlier
//!
//! Traits are named partial overrides applied on top of the defaults.

mod attrs;

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::db::Db;
use crate::error::{MockError, Result};
use crate::schema::Schema;
use crate::store::{Attributes, Record};

pub use attrs::{AttrValue, Attrs};

/// Hook run after a factory-created record is stored.
pub type AfterCreate = fn(&Record, &mut Db) -> Result<()>;

/// How a factory attribute is produced.
#[derive(Clone)]
pub enum Generator {
    Constant(Value),
    Sequence(fn(usize) -> Value),
    Dependent {
        reads: Vec<String>,
        compute: fn(&Attributes) -> Value,
    },
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generator::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Generator::Sequence(_) => f.write_str("Sequence"),
            Generator::Dependent { reads, .. } => {
                f.debug_struct("Dependent").field("reads", reads).finish()
            }
        }
    }
}

/// Ordered attribute generators shared by factories and traits.
#[derive(Debug, Clone, Default)]
struct Generators(Vec<(String, Generator)>);

impl Generators {
    fn set(&mut self, name: &str, generator: Generator) {
        match self.0.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = generator,
            None => self.0.push((name.to_string(), generator)),
        }
    }
}

/// A named partial override of a factory's defaults.
#[derive(Debug, Clone, Default)]
pub struct FactoryTrait {
    generators: Generators,
    after_create: Option<AfterCreate>,
}

impl FactoryTrait {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.generators.set(name, Generator::Constant(value.into()));
        self
    }

    pub fn sequence(mut self, name: &str, generate: fn(usize) -> Value) -> Self {
        self.generators.set(name, Generator::Sequence(generate));
        self
    }

    pub fn dependent(mut self, name: &str, reads: &[&str], compute: fn(&Attributes) -> Value) -> Self {
        self.generators.set(
            name,
            Generator::Dependent {
                reads: reads.iter().map(|r| r.to_string()).collect(),
                compute,
            },
        );
        self
    }

    pub fn after_create(mut self, hook: AfterCreate) -> Self {
        self.after_create = Some(hook);
        self
    }
}

/// Template for one model.
#[derive(Debug, Clone, Default)]
pub struct Factory {
    generators: Generators,
    traits: Vec<(String, FactoryTrait)>,
    after_create: Option<AfterCreate>,
}

impl Factory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constant attribute.
    pub fn attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.generators.set(name, Generator::Constant(value.into()));
        self
    }

    /// Attribute computed from the creation index.
    pub fn sequence(mut self, name: &str, generate: fn(usize) -> Value) -> Self {
        self.generators.set(name, Generator::Sequence(generate));
        self
    }

    /// Attribute computed from already-generated siblings listed in `reads`.
    pub fn dependent(mut self, name: &str, reads: &[&str], compute: fn(&Attributes) -> Value) -> Self {
        self.generators.set(
            name,
            Generator::Dependent {
                reads: reads.iter().map(|r| r.to_string()).collect(),
                compute,
            },
        );
        self
    }

    pub fn with_trait(mut self, name: &str, factory_trait: FactoryTrait) -> Self {
        self.traits.retain(|(n, _)| n != name);
        self.traits.push((name.to_string(), factory_trait));
        self
    }

    pub fn after_create(mut self, hook: AfterCreate) -> Self {
        self.after_create = Some(hook);
        self
    }

    /// Evaluate the attributes for a new record.
    ///
    /// Traits are applied in the order given, each overriding the defaults and
    /// earlier traits. `overrides` win over everything; override keys the factory
    /// doesn't generate are appended after the generated ones, but dependent
    /// attributes can already read them.
    pub fn build(
        &self,
        model: &str,
        index: usize,
        traits: &[&str],
        overrides: &Attributes,
    ) -> Result<Attributes> {
        let mut generators = self.generators.clone();
        for name in traits {
            let factory_trait = self.find_trait(model, name)?;
            for (attr, generator) in &factory_trait.generators.0 {
                generators.set(attr, generator.clone());
            }
        }

        let mut built = Attributes::new();
        for (name, generator) in generators.0 {
            if let Some(value) = overrides.get(&name) {
                built.insert(name, value.clone());
                continue;
            }
            let value = match generator {
                Generator::Constant(value) => value,
                Generator::Sequence(generate) => generate(index),
                Generator::Dependent { reads, compute } => {
                    let mut visible = Attributes::new();
                    for read in &reads {
                        let value = built
                            .get(read)
                            .or_else(|| overrides.get(read))
                            .ok_or_else(|| MockError::InvalidFactory {
                            model: model.to_string(),
                            message: format!("'{name}' reads '{read}' before it is generated"),
                        })?;
                        visible.insert(read.clone(), value.clone());
                    }
                    compute(&visible)
                }
            };
            built.insert(name, value);
        }

        for (name, value) in overrides {
            if !built.contains_key(name) {
                built.insert(name.clone(), value.clone());
            }
        }

        Ok(built)
    }

    /// Hooks to run for a record built with `traits`: the factory's own, then each trait's.
    pub fn hooks(&self, model: &str, traits: &[&str]) -> Result<Vec<AfterCreate>> {
        let mut hooks: Vec<AfterCreate> = self.after_create.into_iter().collect();
        for name in traits {
            hooks.extend(self.find_trait(model, name)?.after_create);
        }
        Ok(hooks)
    }

    fn find_trait(&self, model: &str, name: &str) -> Result<&FactoryTrait> {
        self.traits
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
            .ok_or_else(|| MockError::UnknownTrait {
                model: model.to_string(),
                trait_name: name.to_string(),
            })
    }
}

/// Factories keyed by model name.
#[derive(Debug, Clone, Default)]
pub struct Factories {
    factories: BTreeMap<String, Factory>,
}

impl Factories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: &str, factory: Factory) {
        self.factories.insert(model.to_string(), factory);
    }

    pub fn get(&self, model: &str) -> Option<&Factory> {
        self.factories.get(model)
    }

    /// Check that every factory belongs to a declared model.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        for model in self.factories.keys() {
            schema.get(model)?;
        }
        Ok(())
    }
}
