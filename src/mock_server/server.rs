//! In-process mock JSON:API server.
//!
//! A [`MockServer`] owns a route table and a database. It answers requests
//! whose URL starts with its configured base; an
//! [`HttpClient`](crate::HttpClient) decides which calls go to it.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{RwLock, RwLockWriteGuard};
use url::Url;

use super::state::{HandledRequest, ServerState};
use crate::config::ServerConfig;
use crate::db::Db;
use crate::dispatch::{self, Request};
use crate::error::Result;
use crate::factory::{Attrs, Factories, Factory};
use crate::response::Response;
use crate::routes::Router;
use crate::schema::{ModelDef, Schema};
use crate::store::{Record, RecordKey};

/// Populates a fresh store.
pub type SeedFn = fn(&mut Db) -> Result<()>;

type RouteFn = Box<dyn FnOnce(Router) -> Result<Router> + Send>;

/// Assembles a [`MockServer`].
///
/// ```
/// use jsonapi_mock::{Factory, MockServer, ModelDef};
///
/// # fn example() -> jsonapi_mock::Result<()> {
/// let server = MockServer::builder()
///     .model(ModelDef::new("pizza"))
///     .factory("pizza", Factory::new().attr("kind", "margherita"))
///     .routes(|router| router.resource("pizzas"))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ServerBuilder {
    config: ServerConfig,
    schema: Schema,
    factories: Factories,
    routes: Vec<RouteFn>,
    seeds: Option<SeedFn>,
}

impl ServerBuilder {
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn model(mut self, model: ModelDef) -> Self {
        self.schema.insert(model);
        self
    }

    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn factory(mut self, model: &str, factory: Factory) -> Self {
        self.factories.insert(model, factory);
        self
    }

    pub fn factories(mut self, factories: Factories) -> Self {
        self.factories = factories;
        self
    }

    /// Declare routes. Runs once the schema is complete, in call order.
    pub fn routes<F>(mut self, define: F) -> Self
    where
        F: FnOnce(Router) -> Result<Router> + Send + 'static,
    {
        self.routes.push(Box::new(define));
        self
    }

    /// Seed the store at build time and on [`MockServer::reseed`].
    pub fn seeds(mut self, seeds: SeedFn) -> Self {
        self.seeds = Some(seeds);
        self
    }

    /// Validate factories, register routes and run seeds.
    ///
    /// # Errors
    ///
    /// Returns an error for factories of unknown models, unresolvable
    /// routes, or a failing seed function.
    pub fn build(self) -> Result<MockServer> {
        self.factories.validate(&self.schema)?;
        let schema = Arc::new(self.schema);

        let mut router = Router::new(schema.clone());
        for define in self.routes {
            router = define(router)?;
        }

        let mut db = Db::new(schema, Arc::new(self.factories));
        if let Some(seed) = self.seeds {
            seed(&mut db)?;
        }

        tracing::debug!(
            base = %self.config.base_url(),
            routes = router.routes().len(),
            records = db.store().len(),
            "mock server ready"
        );

        Ok(MockServer {
            config: Arc::new(self.config),
            router: Arc::new(router),
            state: ServerState::new(db).shared(),
            seeds: self.seeds,
        })
    }
}

/// A mock JSON:API server living in the current process.
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct MockServer {
    config: Arc<ServerConfig>,
    router: Arc<Router>,
    state: Arc<RwLock<ServerState>>,
    seeds: Option<SeedFn>,
}

impl std::fmt::Debug for MockServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockServer")
            .field("base_url", &self.config.base_url())
            .field("routes", &self.router.routes().len())
            .finish_non_exhaustive()
    }
}

impl MockServer {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn base_url(&self) -> String {
        self.config.base_url()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Access the shared state directly.
    pub fn state(&self) -> Arc<RwLock<ServerState>> {
        self.state.clone()
    }

    /// Exclusive access to the state, for custom setup in tests.
    pub async fn lock(&self) -> RwLockWriteGuard<'_, ServerState> {
        self.state.write().await
    }

    /// The path (with query) a URL addresses on this server, if the server
    /// should answer it.
    ///
    /// URLs outside the base, and paths declared passthrough, return `None`.
    pub fn route_path(&self, url: &Url) -> Option<String> {
        let base = self.config.base_url();
        let rest = url.as_str().strip_prefix(base.as_str())?;
        let rest = rest.split('#').next().unwrap_or_default();
        if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('?')) {
            return None;
        }

        let path = if rest.starts_with('/') {
            rest.to_string()
        } else {
            format!("/{rest}")
        };
        let bare = path.split('?').next().unwrap_or_default();
        (!self.router.is_passthrough(bare)).then_some(path)
    }

    /// Whether calls to `url` are answered in-process.
    pub fn intercepts(&self, url: &Url) -> bool {
        self.route_path(url).is_some()
    }

    /// Dispatch one request while holding the state lock.
    pub async fn handle(&self, request: Request) -> Response {
        let mut state = self.state.write().await;
        let method = request.method.to_string();
        let path = if request.query.is_empty() {
            request.path.clone()
        } else {
            format!("{}?{}", request.path, request.query)
        };

        let response = dispatch::dispatch(&self.router, &mut state.db, request);
        let status = response.status().as_u16();
        if self.config.logging {
            tracing::info!(%method, %path, status, "handled request");
        } else {
            tracing::debug!(%method, %path, status, "handled request");
        }

        state.handled.push(HandledRequest {
            method,
            path,
            status,
            handled_at: Utc::now(),
        });
        response
    }

    pub async fn create(&self, model: &str, traits: &[&str], attrs: Attrs) -> Result<Record> {
        self.state.write().await.db.create(model, traits, attrs)
    }

    pub async fn create_list(
        &self,
        model: &str,
        count: usize,
        traits: &[&str],
        attrs: Attrs,
    ) -> Result<Vec<Record>> {
        self.state.write().await.db.create_list(model, count, traits, attrs)
    }

    pub async fn create_related(&self, owner: &RecordKey, relationship: &str, attrs: Attrs) -> Result<Record> {
        self.state
            .write()
            .await
            .db
            .create_related(owner, relationship, attrs)
    }

    pub async fn link(&self, owner: &RecordKey, relationship: &str, target: &RecordKey) -> Result<()> {
        self.state
            .write()
            .await
            .db
            .store_mut()
            .link(owner, relationship, target)
    }

    /// Records currently on the other end of `relationship`.
    pub async fn related(&self, owner: &RecordKey, relationship: &str) -> Result<Vec<Record>> {
        let state = self.state.read().await;
        let related = state.db.related(owner, relationship)?;
        Ok(related.records().into_iter().cloned().collect())
    }

    pub async fn find(&self, model: &str, id: &str) -> Result<Record> {
        self.state.read().await.db.find(model, id)
    }

    pub async fn all(&self, model: &str) -> Result<Vec<Record>> {
        self.state.read().await.db.all(model)
    }

    pub async fn delete(&self, model: &str, id: &str) -> Result<Record> {
        self.state.write().await.db.delete(model, id)
    }

    /// Empty the store and the request log. Id counters restart at 1.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.db.reset();
        state.handled.clear();
    }

    /// Reset, then run the builder's seed function again.
    pub async fn reseed(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.db.reset();
        state.handled.clear();
        match self.seeds {
            Some(seed) => seed(&mut state.db),
            None => Ok(()),
        }
    }

    /// The store as JSON, keyed by model plural.
    pub async fn dump(&self) -> Value {
        self.state.read().await.db.store().dump()
    }

    /// Requests answered so far, oldest first.
    pub async fn handled_requests(&self) -> Vec<HandledRequest> {
        self.state.read().await.handled.clone()
    }
}
