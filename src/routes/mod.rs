//! Route registry.
//!
//! Routes are kept in declaration order and matched by exact verb, then by the
//! first pattern that fits the path. Handlers are either custom functions or
//! CRUD shorthands bound to a model when the route is registered.

mod pattern;

use std::fmt;
use std::sync::Arc;

use reqwest::{Method, StatusCode};

use crate::db::Db;
use crate::error::{MockError, Result};
use crate::request::{HandlerRequest, Reply};
use crate::schema::Schema;

pub use pattern::{Params, PathPattern};

/// A custom route handler.
pub type HandlerFn = fn(&mut Db, &HandlerRequest) -> Result<Reply>;

/// The CRUD shapes a shorthand can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrudKind {
    List,
    Show,
    Create,
    Update,
    Delete,
}

impl CrudKind {
    pub const ALL: [CrudKind; 5] = [
        CrudKind::List,
        CrudKind::Show,
        CrudKind::Create,
        CrudKind::Update,
        CrudKind::Delete,
    ];

    /// Status used when the handler doesn't pick one.
    pub fn default_status(self) -> StatusCode {
        match self {
            CrudKind::List | CrudKind::Show | CrudKind::Update => StatusCode::OK,
            CrudKind::Create => StatusCode::CREATED,
            CrudKind::Delete => StatusCode::NO_CONTENT,
        }
    }

    /// Infer the shorthand from a verb and whether the path ends in an id.
    pub fn infer(method: &Method, has_id: bool) -> Option<Self> {
        match (method.as_str(), has_id) {
            ("GET", false) => Some(CrudKind::List),
            ("GET", true) => Some(CrudKind::Show),
            ("POST", false) => Some(CrudKind::Create),
            ("PATCH" | "PUT", true) => Some(CrudKind::Update),
            ("DELETE", true) => Some(CrudKind::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for CrudKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrudKind::List => "list",
            CrudKind::Show => "show",
            CrudKind::Create => "create",
            CrudKind::Update => "update",
            CrudKind::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// How a route produces its reply.
#[derive(Clone)]
pub enum Handler {
    Shorthand { kind: CrudKind, model: String },
    Custom(HandlerFn),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Shorthand { kind, model } => write!(f, "Shorthand({kind} {model})"),
            Handler::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Shorthand { kind, model } => write!(f, "{kind} {model}"),
            Handler::Custom(_) => f.write_str("custom"),
        }
    }
}

/// One registered route.
#[derive(Debug, Clone)]
pub struct RouteBinding {
    pub method: Method,
    pub pattern: PathPattern,
    pub handler: Handler,
    /// Status declared at registration, overriding the handler default.
    pub status: Option<StatusCode>,
}

impl RouteBinding {
    /// Status to report when the handler's reply doesn't set one.
    pub fn default_status(&self) -> StatusCode {
        self.status.unwrap_or(match &self.handler {
            Handler::Shorthand { kind, .. } => kind.default_status(),
            Handler::Custom(_) => StatusCode::OK,
        })
    }
}

/// Ordered route table.
#[derive(Debug, Clone)]
pub struct Router {
    schema: Arc<Schema>,
    routes: Vec<RouteBinding>,
    passthrough: Vec<PathPattern>,
}

impl Router {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            routes: Vec::new(),
            passthrough: Vec::new(),
        }
    }

    /// Register a route with an explicit handler and optional status.
    pub fn route(mut self, method: Method, path: &str, handler: Handler, status: Option<StatusCode>) -> Self {
        let pattern = PathPattern::parse(path);
        tracing::debug!(%method, path = pattern.as_str(), %handler, "registered route");
        self.routes.push(RouteBinding {
            method,
            pattern,
            handler,
            status,
        });
        self
    }

    pub fn get(self, path: &str, handler: HandlerFn) -> Self {
        self.route(Method::GET, path, Handler::Custom(handler), None)
    }

    pub fn post(self, path: &str, handler: HandlerFn) -> Self {
        self.route(Method::POST, path, Handler::Custom(handler), None)
    }

    pub fn put(self, path: &str, handler: HandlerFn) -> Self {
        self.route(Method::PUT, path, Handler::Custom(handler), None)
    }

    pub fn patch(self, path: &str, handler: HandlerFn) -> Self {
        self.route(Method::PATCH, path, Handler::Custom(handler), None)
    }

    pub fn delete(self, path: &str, handler: HandlerFn) -> Self {
        self.route(Method::DELETE, path, Handler::Custom(handler), None)
    }

    /// Register a CRUD shorthand, inferring the model from the path's last
    /// literal segment and the kind from the verb.
    pub fn shorthand(self, method: Method, path: &str) -> Result<Self> {
        let pattern = PathPattern::parse(path);
        let kind = CrudKind::infer(&method, pattern.ends_with_param()).ok_or_else(|| {
            MockError::InvalidRoute(format!("no shorthand for {method} {pattern}"))
        })?;
        let model = pattern
            .last_literal()
            .ok_or_else(|| MockError::UnknownModel(pattern.as_str().to_string()))
            .and_then(|segment| self.schema.get_by_type(segment))?
            .name
            .clone();

        Ok(self.route(method, path, Handler::Shorthand { kind, model }, None))
    }

    /// Register all five shorthands for the model whose plural is `plural`.
    pub fn resource(self, plural: &str) -> Result<Self> {
        self.resource_only(plural, &CrudKind::ALL)
    }

    /// Register the listed shorthands for `plural`.
    pub fn resource_only(mut self, plural: &str, kinds: &[CrudKind]) -> Result<Self> {
        let model = self.schema.get_by_type(plural)?.name.clone();
        let collection = format!("/{}", plural.trim_matches('/'));
        let member = format!("{collection}/:id");

        for kind in CrudKind::ALL.into_iter().filter(|k| kinds.contains(k)) {
            let handler = Handler::Shorthand {
                kind,
                model: model.clone(),
            };
            self = match kind {
                CrudKind::List => self.route(Method::GET, &collection, handler, None),
                CrudKind::Show => self.route(Method::GET, &member, handler, None),
                CrudKind::Create => self.route(Method::POST, &collection, handler, None),
                CrudKind::Update => self
                    .route(Method::PATCH, &member, handler.clone(), None)
                    .route(Method::PUT, &member, handler, None),
                CrudKind::Delete => self.route(Method::DELETE, &member, handler, None),
            };
        }
        Ok(self)
    }

    /// Register all shorthands except the listed ones.
    pub fn resource_except(self, plural: &str, kinds: &[CrudKind]) -> Result<Self> {
        let keep: Vec<CrudKind> = CrudKind::ALL
            .into_iter()
            .filter(|k| !kinds.contains(k))
            .collect();
        self.resource_only(plural, &keep)
    }

    /// Let requests under the intercepted base that match `path` reach the network.
    pub fn passthrough(mut self, path: &str) -> Self {
        self.passthrough.push(PathPattern::parse(path));
        self
    }

    pub fn is_passthrough(&self, path: &str) -> bool {
        self.passthrough.iter().any(|p| p.matches(path).is_some())
    }

    /// Find the first route for `method` whose pattern matches `path`.
    pub fn find(&self, method: &Method, path: &str) -> Option<(&RouteBinding, Params)> {
        self.routes
            .iter()
            .filter(|r| r.method == *method)
            .find_map(|r| r.pattern.matches(path).map(|params| (r, params)))
    }

    pub fn routes(&self) -> &[RouteBinding] {
        &self.routes
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ModelDef;

    fn ping(_db: &mut Db, _request: &HandlerRequest) -> Result<Reply> {
        Ok(Reply::text("pong"))
    }

    fn router() -> Router {
        let schema = Schema::new()
            .model(ModelDef::new("document"))
            .model(ModelDef::new("rocky").plural("rockies"));
        Router::new(Arc::new(schema))
    }

    #[test]
    fn test_verb_must_match_exactly() {
        let router = router().get("/ping", ping);

        assert!(router.find(&Method::GET, "/ping").is_some());
        assert!(router.find(&Method::POST, "/ping").is_none());
    }

    #[test]
    fn test_first_declared_route_wins() {
        let router = router()
            .route(Method::GET, "/documents/:id", Handler::Custom(ping), Some(StatusCode::ACCEPTED))
            .route(Method::GET, "/documents/latest", Handler::Custom(ping), None);

        let (route, params) = router.find(&Method::GET, "/documents/latest").unwrap();
        assert_eq!(route.status, Some(StatusCode::ACCEPTED));
        assert_eq!(params["id"], "latest");
    }

    #[test]
    fn test_resource_registers_crud_shorthands() {
        let router = router().resource("rockies").unwrap();

        let expectations = [
            (Method::GET, "/rockies", CrudKind::List),
            (Method::GET, "/rockies/1", CrudKind::Show),
            (Method::POST, "/rockies", CrudKind::Create),
            (Method::PATCH, "/rockies/1", CrudKind::Update),
            (Method::PUT, "/rockies/1", CrudKind::Update),
            (Method::DELETE, "/rockies/1", CrudKind::Delete),
        ];
        for (method, path, expected) in expectations {
            let (route, _) = router.find(&method, path).unwrap();
            match &route.handler {
                Handler::Shorthand { kind, model } => {
                    assert_eq!(*kind, expected);
                    assert_eq!(model, "rocky");
                }
                Handler::Custom(_) => panic!("expected shorthand for {method} {path}"),
            }
        }
    }

    #[test]
    fn test_resource_only_and_except() {
        let router = router()
            .resource_only("documents", &[CrudKind::List])
            .unwrap()
            .resource_except("rockies", &[CrudKind::Delete])
            .unwrap();

        assert!(router.find(&Method::GET, "/documents").is_some());
        assert!(router.find(&Method::GET, "/documents/1").is_none());
        assert!(router.find(&Method::PATCH, "/rockies/1").is_some());
        assert!(router.find(&Method::DELETE, "/rockies/1").is_none());
    }

    #[test]
    fn test_shorthand_infers_model_and_kind() {
        let router = router().shorthand(Method::GET, "/documents/:id").unwrap();

        let (route, _) = router.find(&Method::GET, "/documents/4").unwrap();
        assert_eq!(route.default_status(), StatusCode::OK);
        assert!(matches!(
            &route.handler,
            Handler::Shorthand { kind: CrudKind::Show, model } if model == "document"
        ));

        assert!(matches!(
            router.clone().shorthand(Method::GET, "/ghosts"),
            Err(MockError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_default_statuses() {
        assert_eq!(CrudKind::Create.default_status(), StatusCode::CREATED);
        assert_eq!(CrudKind::Delete.default_status(), StatusCode::NO_CONTENT);
        assert_eq!(CrudKind::Update.default_status(), StatusCode::OK);
    }

    #[test]
    fn test_passthrough_patterns() {
        let router = router().passthrough("/assets/*");

        assert!(router.is_passthrough("/assets/logo.png"));
        assert!(!router.is_passthrough("/documents"));
    }
}
