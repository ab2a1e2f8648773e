//! Model registry.
//!
//! Every record type the server knows about is declared once as a [`ModelDef`]:
//! its JSON:API type name (a fixed plural), its relationships and its serializer
//! options. The store, the factories, the router and the serializer all resolve
//! model names through the same [`Schema`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MockError, Result};

/// Cardinality of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Has-one / belongs-to.
    One,
    /// Has-many.
    Many,
}

/// A named association from one model to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDef {
    /// Relationship name as it appears in `relationships` and `include`.
    pub name: String,
    /// Target model name (singular).
    pub model: String,
    pub cardinality: Cardinality,
    /// Explicit inverse relationship name on the target model.
    pub inverse: Option<String>,
    /// Opt out of inverse inference entirely.
    pub one_way: bool,
}

impl RelationshipDef {
    /// A has-one relationship to `model`.
    pub fn one(name: &str, model: &str) -> Self {
        Self {
            name: name.to_string(),
            model: model.to_string(),
            cardinality: Cardinality::One,
            inverse: None,
            one_way: false,
        }
    }

    /// A has-many relationship to `model`.
    pub fn many(name: &str, model: &str) -> Self {
        Self {
            cardinality: Cardinality::Many,
            ..Self::one(name, model)
        }
    }

    /// Name the inverse relationship on the target model.
    pub fn inverse(mut self, name: &str) -> Self {
        self.inverse = Some(name.to_string());
        self.one_way = false;
        self
    }

    /// Never keep an inverse in sync for this relationship.
    pub fn one_way(mut self) -> Self {
        self.inverse = None;
        self.one_way = true;
        self
    }

    pub fn is_many(&self) -> bool {
        self.cardinality == Cardinality::Many
    }
}

/// Per-model serializer options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializerOptions {
    /// Relationships always embedded in `included`, requested or not.
    pub include: Vec<String>,
    /// When set, only these attributes are rendered.
    pub attrs: Option<Vec<String>>,
}

/// Declaration of a single model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDef {
    pub name: String,
    /// JSON:API `type` and default route segment.
    pub plural: String,
    pub relationships: Vec<RelationshipDef>,
    pub serializer: SerializerOptions,
}

impl ModelDef {
    /// Declare a model. The plural defaults to `name + "s"`; use [`ModelDef::plural`]
    /// for anything else.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            plural: format!("{name}s"),
            relationships: Vec::new(),
            serializer: SerializerOptions::default(),
        }
    }

    pub fn plural(mut self, plural: &str) -> Self {
        self.plural = plural.to_string();
        self
    }

    pub fn has_many(self, name: &str, model: &str) -> Self {
        self.relationship(RelationshipDef::many(name, model))
    }

    pub fn belongs_to(self, name: &str, model: &str) -> Self {
        self.relationship(RelationshipDef::one(name, model))
    }

    pub fn relationship(mut self, relationship: RelationshipDef) -> Self {
        self.relationships.retain(|r| r.name != relationship.name);
        self.relationships.push(relationship);
        self
    }

    /// Always include these relationships when serializing records of this model.
    pub fn auto_include(mut self, relationships: &[&str]) -> Self {
        self.serializer.include = relationships.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Restrict serialized attributes to this list.
    pub fn attrs(mut self, attrs: &[&str]) -> Self {
        self.serializer.attrs = Some(attrs.iter().map(|a| a.to_string()).collect());
        self
    }

    /// Look up a relationship by name.
    pub fn get_relationship(&self, name: &str) -> Option<&RelationshipDef> {
        self.relationships.iter().find(|r| r.name == name)
    }
}

/// The set of declared models.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    models: BTreeMap<String, ModelDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a model declaration.
    pub fn model(mut self, model: ModelDef) -> Self {
        self.insert(model);
        self
    }

    pub fn insert(&mut self, model: ModelDef) {
        self.models.insert(model.name.clone(), model);
    }

    /// Look up a model by its singular name.
    pub fn get(&self, name: &str) -> Result<&ModelDef> {
        self.models
            .get(name)
            .ok_or_else(|| MockError::UnknownModel(name.to_string()))
    }

    /// Look up a model by its JSON:API type (plural), falling back to the singular name.
    pub fn get_by_type(&self, type_name: &str) -> Result<&ModelDef> {
        self.models
            .values()
            .find(|m| m.plural == type_name)
            .or_else(|| self.models.get(type_name))
            .ok_or_else(|| MockError::UnknownModel(type_name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelDef> {
        self.models.values()
    }

    /// Look up `model.relationship`.
    pub fn relationship(&self, model: &str, relationship: &str) -> Result<&RelationshipDef> {
        self.get(model)?
            .get_relationship(relationship)
            .ok_or_else(|| MockError::UnknownRelationship {
                model: model.to_string(),
                relationship: relationship.to_string(),
            })
    }

    /// Resolve the inverse of `model.relationship`, if it has one.
    ///
    /// An explicit inverse wins. Otherwise the inverse is inferred when the target
    /// model declares exactly one eligible relationship pointing back at `model`.
    pub fn inverse_of(&self, model: &str, relationship: &str) -> Option<&RelationshipDef> {
        let def = self.relationship(model, relationship).ok()?;
        if def.one_way {
            return None;
        }
        let target = self.models.get(&def.model)?;

        if let Some(name) = &def.inverse {
            return target.get_relationship(name);
        }

        let mut candidates = target.relationships.iter().filter(|candidate| {
            candidate.model == model
                && !candidate.one_way
                && !(target.name == model && candidate.name == relationship)
                && candidate
                    .inverse
                    .as_deref()
                    .map(|n| n == relationship)
                    .unwrap_or(true)
        });

        match (candidates.next(), candidates.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }
}
