//! Scenario files: a server described in JSON.
//!
//! ```json
//! {
//!   "config": { "urlPrefix": "https://api.test", "namespace": "api" },
//!   "models": {
//!     "folder": { "relationships": { "documents": { "kind": "many", "model": "document" } } },
//!     "document": { "relationships": { "folder": { "kind": "one", "model": "folder" } } }
//!   },
//!   "factories": { "document": { "attrs": { "title": "Untitled" } } },
//!   "resources": ["folders", "documents"],
//!   "records": [
//!     { "type": "folder", "attributes": { "name": "Notes" } },
//!     { "type": "document", "attributes": { "folderId": "1" }, "count": 2 }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::factory::{Attrs, Factory, FactoryTrait};
use crate::mock_server::MockServer;
use crate::schema::{Cardinality, ModelDef, RelationshipDef, Schema};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub config: ScenarioConfig,
    #[serde(default)]
    pub models: BTreeMap<String, ScenarioModel>,
    #[serde(default)]
    pub factories: BTreeMap<String, ScenarioFactory>,
    /// Plurals to register full CRUD shorthands for.
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub passthrough: Vec<String>,
    /// Records created, in order, when the server is built.
    #[serde(default)]
    pub records: Vec<ScenarioRecord>,
}

/// Overrides applied on top of [`ServerConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioConfig {
    pub url_prefix: Option<String>,
    pub namespace: Option<String>,
    pub logging: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioModel {
    pub plural: Option<String>,
    #[serde(default)]
    pub relationships: BTreeMap<String, ScenarioRelationship>,
    /// Relationships always embedded in `included`.
    #[serde(default)]
    pub include: Vec<String>,
    /// Attribute whitelist for serialization.
    pub attrs: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRelationship {
    pub kind: Cardinality,
    pub model: String,
    pub inverse: Option<String>,
    #[serde(default)]
    pub one_way: bool,
}

/// Constant attributes plus named traits.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioFactory {
    #[serde(default)]
    pub attrs: Map<String, Value>,
    #[serde(default)]
    pub traits: BTreeMap<String, Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRecord {
    /// Model name (singular).
    #[serde(rename = "type")]
    pub model: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default = "one")]
    pub count: usize,
}

fn one() -> usize {
    1
}

impl Scenario {
    /// Read and parse a scenario file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let scenario: Scenario = serde_json::from_str(&raw)?;
        tracing::debug!(
            path = %path.display(),
            models = scenario.models.len(),
            records = scenario.records.len(),
            "loaded scenario"
        );
        Ok(scenario)
    }

    pub fn server_config(&self) -> ServerConfig {
        let mut config = ServerConfig::default();
        if let Some(prefix) = &self.config.url_prefix {
            config = config.with_url_prefix(prefix);
        }
        if let Some(namespace) = &self.config.namespace {
            config = config.with_namespace(namespace);
        }
        if let Some(logging) = self.config.logging {
            config = config.with_logging(logging);
        }
        config
    }

    pub fn schema(&self) -> Schema {
        let mut schema = Schema::new();
        for (name, model) in &self.models {
            let mut def = ModelDef::new(name);
            if let Some(plural) = &model.plural {
                def = def.plural(plural);
            }
            for (rel_name, rel) in &model.relationships {
                let mut relationship = match rel.kind {
                    Cardinality::One => RelationshipDef::one(rel_name, &rel.model),
                    Cardinality::Many => RelationshipDef::many(rel_name, &rel.model),
                };
                if let Some(inverse) = &rel.inverse {
                    relationship = relationship.inverse(inverse);
                } else if rel.one_way {
                    relationship = relationship.one_way();
                }
                def = def.relationship(relationship);
            }
            let include: Vec<&str> = model.include.iter().map(String::as_str).collect();
            def = def.auto_include(&include);
            if let Some(attrs) = &model.attrs {
                let attrs: Vec<&str> = attrs.iter().map(String::as_str).collect();
                def = def.attrs(&attrs);
            }
            schema.insert(def);
        }
        schema
    }

    /// Build the server and create the scenario's records.
    pub async fn into_server(self) -> Result<MockServer> {
        let mut builder = MockServer::builder()
            .config(self.server_config())
            .schema(self.schema());

        for (model, spec) in &self.factories {
            let mut factory = Factory::new();
            for (name, value) in &spec.attrs {
                factory = factory.attr(name, value.clone());
            }
            for (trait_name, attrs) in &spec.traits {
                let factory_trait = attrs
                    .iter()
                    .fold(FactoryTrait::new(), |t, (name, value)| t.attr(name, value.clone()));
                factory = factory.with_trait(trait_name, factory_trait);
            }
            builder = builder.factory(model, factory);
        }

        let resources = self.resources.clone();
        let passthrough = self.passthrough.clone();
        let server = builder
            .routes(move |router| {
                let router = passthrough.iter().fold(router, |r, path| r.passthrough(path));
                resources.iter().try_fold(router, |r, plural| r.resource(plural))
            })
            .build()?;

        for record in self.records {
            let traits: Vec<&str> = record.traits.iter().map(String::as_str).collect();
            server
                .create_list(
                    &record.model,
                    record.count,
                    &traits,
                    Attrs::from_json(Value::Object(record.attributes)),
                )
                .await?;
        }
        Ok(server)
    }
}
