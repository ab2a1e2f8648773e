//! In-process JSON:API mock server.
//!
//! Drive client-side tests without a network: declare models and their
//! relationships, populate an in-memory store with factories, register routes,
//! and point an [`HttpClient`] at the server. Calls under the server's base URL
//! are answered in-process with JSON:API documents; everything else passes
//! through to the network unchanged.
//!
//! # Quick Start
//!
//! ```
//! use jsonapi_mock::{Attrs, Factory, HttpClient, MockServer, ModelDef};
//! use serde_json::Value;
//!
//! # async fn example() -> jsonapi_mock::Result<()> {
//! let server = MockServer::builder()
//!     .model(ModelDef::new("folder").has_many("documents", "document"))
//!     .model(ModelDef::new("document").belongs_to("folder", "folder"))
//!     .factory("document", Factory::new().attr("title", "Untitled"))
//!     .routes(|router| router.resource("folders")?.resource("documents"))
//!     .build()?;
//!
//! let folder = server.create("folder", &[], Attrs::new().with("name", "Notes")).await?;
//! server
//!     .create_related(&folder.key(), "documents", Attrs::new().with("title", "Hello World"))
//!     .await?;
//!
//! let client = HttpClient::new()?.intercept(server.clone());
//! let doc: Value = client
//!     .get("https://api.test/folders?include=documents")
//!     .await?
//!     .json()
//!     .await?;
//! assert_eq!(doc["included"][0]["attributes"]["title"], "Hello World");
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`Store`] holds records per model and keeps both sides of every
//!   relationship in sync.
//! - [`Factory`] builds attributes from constants, sequences and traits;
//!   [`Db`] combines the two.
//! - [`Router`] maps verb and path patterns to custom handlers or CRUD
//!   shorthands; [`dispatch`] runs one request and never fails.
//! - [`Serializer`] renders records as JSON:API documents with `included`.
//! - [`MockServer`] and [`HttpClient`] provide the async, intercepted surface.
//!
//! # Configuration
//!
//! [`ServerConfig::from_env`] reads:
//!
//! - `MOCK_API_URL` (optional) - URL prefix (defaults to `https://api.test`)
//! - `MOCK_API_NAMESPACE` (optional) - path prefix shared by all routes
//! - `MOCK_API_LOGGING` (optional) - log handled requests at info level

pub mod cli;
mod client;
mod config;
mod db;
mod dispatch;
mod error;
mod factory;
mod handlers;
pub mod mock_server;
mod output;
mod request;
mod response;
mod routes;
mod scenario;
mod schema;
mod serializer;
mod store;

// Re-export core types
pub use client::{HttpClient, NetworkTransport, OutgoingRequest, RequestInit, Transport};
pub use config::ServerConfig;
pub use db::Db;
pub use dispatch::{dispatch, error_response, Request};
pub use error::{MockError, Result};
pub use mock_server::{Fixtures, HandledRequest, MockServer, SeedFn, ServerBuilder, ServerState};
pub use output::PrettyPrint;
pub use response::{Response, JSON_CONTENT_TYPE, TEXT_CONTENT_TYPE};
pub use scenario::Scenario;

// Re-export the data model
pub use factory::{AfterCreate, AttrValue, Attrs, Factories, Factory, FactoryTrait, Generator};
pub use schema::{Cardinality, ModelDef, RelationshipDef, Schema, SerializerOptions};
pub use store::{Attributes, Linkage, Record, RecordKey, Related, Store};

// Re-export routing and serialization
pub use request::{HandlerRequest, Payload, QueryParams, Reply, JSONAPI_MEDIA_TYPE};
pub use routes::{CrudKind, Handler, HandlerFn, Params, PathPattern, RouteBinding, Router};
pub use serializer::{
    Document, PrimaryData, RelationshipObject, ResourceIdentifier, ResourceLinkage,
    ResourceObject, Serializer,
};
