//! A ready-made demo scenario.
//!
//! Folders and documents, pizzas, the Rocky films, and albums that always
//! embed their artists. Used by the CLI when no scenario file is given, and
//! by tests that want a populated server without declaring one.

use serde_json::{json, Value};

use super::server::{MockServer, ServerBuilder};
use crate::config::ServerConfig;
use crate::db::Db;
use crate::error::Result;
use crate::factory::{Attrs, Factory, FactoryTrait};
use crate::request::{HandlerRequest, Reply};
use crate::routes::Router;
use crate::schema::{ModelDef, Schema};

const ROCKY_TITLES: [&str; 6] = [
    "Rocky",
    "Rocky II",
    "Rocky III",
    "Rocky IV",
    "Rocky V",
    "Rocky Balboa",
];

/// Collection of fixture builders for the demo scenario.
pub struct Fixtures;

impl Fixtures {
    /// Models of the demo scenario.
    pub fn schema() -> Schema {
        Schema::new()
            .model(ModelDef::new("folder").has_many("documents", "document"))
            .model(ModelDef::new("document").belongs_to("folder", "folder"))
            .model(ModelDef::new("pizza"))
            .model(ModelDef::new("rocky").plural("rockies"))
            .model(
                ModelDef::new("album")
                    .has_many("artists", "artist")
                    .auto_include(&["artists"]),
            )
            .model(ModelDef::new("artist").has_many("albums", "album"))
    }

    pub fn pizza_factory() -> Factory {
        Factory::new().attr("kind", "margherita")
    }

    /// Titles follow the film series; past the sixth, `Rocky 7`, `Rocky 8`, ...
    pub fn rocky_factory() -> Factory {
        Factory::new().sequence("title", rocky_title)
    }

    pub fn document_factory() -> Factory {
        Factory::new()
            .sequence("title", |i| Value::from(format!("Document {}", i + 1)))
            .with_trait("rfc", FactoryTrait::new().attr("title", "RFC-001: Example RFC"))
    }

    /// Routes of the demo scenario.
    pub fn routes(router: Router) -> Result<Router> {
        router
            .get("/ping", ping)
            .get("/ping.json", ping_json)
            .resource("documents")?
            .resource("folders")?
            .resource("pizzas")?
            .resource("rockies")?
            .resource("albums")?
            .resource("artists")
    }

    /// Builder with the demo schema, factories and routes, ready for more.
    pub fn builder() -> ServerBuilder {
        MockServer::builder()
            .schema(Self::schema())
            .factory("document", Self::document_factory())
            .factory("pizza", Self::pizza_factory())
            .factory("rocky", Self::rocky_factory())
            .routes(Self::routes)
    }

    /// The demo server with an empty store.
    pub fn server() -> Result<MockServer> {
        Self::builder().build()
    }

    /// The demo server with a few records in every table.
    pub fn seeded_server() -> Result<MockServer> {
        Self::seeded_server_with(ServerConfig::default())
    }

    /// The seeded demo server listening on `config`'s base URL.
    pub fn seeded_server_with(config: ServerConfig) -> Result<MockServer> {
        Self::builder().config(config).seeds(Self::seed).build()
    }

    /// Seed function for the demo scenario.
    pub fn seed(db: &mut Db) -> Result<()> {
        let notes = db.create("folder", &[], json!({ "name": "Notes" }).into())?;
        db.create_related(&notes.key(), "documents", json!({ "title": "Hello World" }).into())?;
        db.create("document", &["rfc"], Attrs::new())?;
        db.create("pizza", &[], Attrs::new())?;
        db.create_list("rocky", ROCKY_TITLES.len(), &[], Attrs::new())?;

        let artist = db.create("artist", &[], json!({ "name": "Mary Lou Williams" }).into())?;
        db.create(
            "album",
            &[],
            Attrs::new()
                .with("title", "Zoning")
                .with("artists", vec![artist]),
        )?;
        Ok(())
    }
}

fn rocky_title(index: usize) -> Value {
    match ROCKY_TITLES.get(index) {
        Some(title) => Value::from(*title),
        None => Value::from(format!("Rocky {}", index + 1)),
    }
}

fn ping(_db: &mut Db, _request: &HandlerRequest) -> Result<Reply> {
    Ok(Reply::text("pong"))
}

fn ping_json(_db: &mut Db, _request: &HandlerRequest) -> Result<Reply> {
    Ok(Reply::json(json!({ "result": "pong" })))
}
