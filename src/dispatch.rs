//! Turn a request into a response against the route table and database.
//!
//! Nothing fails past this point: handler and serializer errors become error
//! documents with the status [`MockError::status`] picks.

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use crate::db::Db;
use crate::error::{MockError, Result};
use crate::handlers;
use crate::request::{HandlerRequest, Payload, QueryParams};
use crate::response::{Response, JSON_CONTENT_TYPE, TEXT_CONTENT_TYPE};
use crate::routes::{Handler, RouteBinding, Router};
use crate::serializer::Serializer;

/// A request addressed to the server, with the base URL already stripped.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl Request {
    pub fn new(method: Method, path: &str) -> Self {
        let (path, query) = path.split_once('?').unwrap_or((path, ""));
        Self {
            method,
            path: path.to_string(),
            query: query.to_string(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Run one request to completion.
pub fn dispatch(router: &Router, db: &mut Db, request: Request) -> Response {
    let Some((route, params)) = router.find(&request.method, &request.path) else {
        tracing::warn!(method = %request.method, path = %request.path, "no route matched");
        return error_response(&MockError::RouteNotFound {
            method: request.method.to_string(),
            path: request.path,
        });
    };

    let query = match QueryParams::parse(&request.query) {
        Ok(query) => query,
        Err(e) => {
            tracing::debug!(method = %request.method, path = %request.path, error = %e, "rejected query");
            return error_response(&e);
        }
    };
    let request = HandlerRequest {
        method: request.method,
        path: request.path,
        params,
        query,
        headers: request.headers,
        body: request.body,
    };

    match respond(route, db, &request) {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(method = %request.method, path = %request.path, error = %e, "handler failed");
            error_response(&e)
        }
    }
}

fn respond(route: &RouteBinding, db: &mut Db, request: &HandlerRequest) -> Result<Response> {
    let includes = request.query.include();
    // Shorthands know their model, so a bad include fails before anything is written.
    if let Handler::Shorthand { model, .. } = &route.handler {
        Serializer::new(db.store()).check_includes(model, includes)?;
    }

    let reply = match &route.handler {
        Handler::Shorthand { kind, model } => handlers::run(*kind, model, route, db, request)?,
        Handler::Custom(handler) => handler(db, request)?,
    };
    let status = reply.status.unwrap_or_else(|| route.default_status());
    let serializer = Serializer::new(db.store());

    let response = match reply.payload {
        Payload::Record(key) => json_response(status, &serializer.serialize_record(&key, includes)?)?,
        Payload::Collection(keys) => {
            json_response(status, &serializer.serialize_collection(&keys, includes)?)?
        }
        Payload::Json(value) => json_response(status, &value)?,
        Payload::Text(text) => Response::with_body(status, TEXT_CONTENT_TYPE, text),
        Payload::Empty if reply.status.is_none() && route.status.is_none() => {
            Response::empty(StatusCode::NO_CONTENT)
        }
        Payload::Empty => Response::empty(status),
    };
    Ok(response)
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> Result<Response> {
    Ok(Response::with_body(status, JSON_CONTENT_TYPE, serde_json::to_vec(body)?))
}

/// Render an error as `{"errors":[{status,title,detail}]}`.
pub fn error_response(error: &MockError) -> Response {
    let status = error.status();
    let body: Value = json!({
        "errors": [{
            "status": status.as_str(),
            "title": status.canonical_reason().unwrap_or("Error"),
            "detail": error.to_string(),
        }]
    });
    Response::with_body(status, JSON_CONTENT_TYPE, body.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::header::{HeaderValue, CONTENT_TYPE};

    use super::*;
    use crate::factory::{Attrs, Factories};
    use crate::request::Reply;
    use crate::schema::{ModelDef, Schema};

    fn ping(_db: &mut Db, _request: &HandlerRequest) -> Result<Reply> {
        Ok(Reply::text("pong"))
    }

    fn accepted(_db: &mut Db, _request: &HandlerRequest) -> Result<Reply> {
        Ok(Reply::empty().with_status(StatusCode::ACCEPTED))
    }

    fn setup() -> (Router, Db) {
        let schema = Arc::new(
            Schema::new()
                .model(ModelDef::new("folder").has_many("documents", "document"))
                .model(ModelDef::new("document").belongs_to("folder", "folder")),
        );
        let router = Router::new(schema.clone())
            .get("/ping", ping)
            .post("/jobs", accepted)
            .resource("documents")
            .unwrap()
            .resource("folders")
            .unwrap();
        (router, Db::new(schema, Arc::new(Factories::new())))
    }

    fn body(response: &Response) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[test]
    fn test_text_reply() {
        let (router, mut db) = setup();

        let response = dispatch(&router, &mut db, Request::new(Method::GET, "/ping"));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.content_type(), Some(TEXT_CONTENT_TYPE));
        assert_eq!(response.body(), b"pong");
    }

    #[test]
    fn test_unmatched_route_is_404_document() {
        let (router, mut db) = setup();

        let response = dispatch(&router, &mut db, Request::new(Method::GET, "/nothing"));

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&response)["errors"][0]["status"], "404");
    }

    #[test]
    fn test_show_missing_record_is_404() {
        let (router, mut db) = setup();

        let response = dispatch(&router, &mut db, Request::new(Method::GET, "/documents/7"));

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&response)["errors"][0]["detail"], "document '7' not found");
    }

    #[test]
    fn test_list_with_include_and_filter() {
        let (router, mut db) = setup();
        let folder = db.create("folder", &[], Attrs::new().with("name", "Notes")).unwrap();
        db.create_related(&folder.key(), "documents", Attrs::new().with("title", "Hello"))
            .unwrap();
        db.create("folder", &[], Attrs::new().with("name", "Empty")).unwrap();

        let response = dispatch(
            &router,
            &mut db,
            Request::new(Method::GET, "/folders?include=documents&filter[name]=Notes"),
        );

        let doc = body(&response);
        assert_eq!(doc["data"].as_array().unwrap().len(), 1);
        assert_eq!(doc["data"][0]["relationships"]["documents"]["data"][0]["id"], "1");
        assert_eq!(doc["included"][0]["attributes"]["title"], "Hello");
    }

    #[test]
    fn test_create_update_delete() {
        let (router, mut db) = setup();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        let created = dispatch(
            &router,
            &mut db,
            Request::new(Method::POST, "/documents")
                .with_headers(headers.clone())
                .with_body(r#"{"title":"Draft"}"#),
        );
        assert_eq!(created.status(), StatusCode::CREATED);
        assert_eq!(body(&created)["data"]["id"], "1");

        let updated = dispatch(
            &router,
            &mut db,
            Request::new(Method::PATCH, "/documents/1")
                .with_headers(headers)
                .with_body(r#"{"title":"Final"}"#),
        );
        assert_eq!(body(&updated)["data"]["attributes"]["title"], "Final");

        let deleted = dispatch(&router, &mut db, Request::new(Method::DELETE, "/documents/1"));
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
        assert!(deleted.body().is_empty());
        assert!(db.all("document").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_body_is_400() {
        let (router, mut db) = setup();

        let response = dispatch(
            &router,
            &mut db,
            Request::new(Method::POST, "/documents").with_body("{oops"),
        );

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(db.all("document").unwrap().is_empty());
    }

    #[test]
    fn test_bad_include_rejects_write_before_storing() {
        let (router, mut db) = setup();
        db.create("document", &[], Attrs::new().with("title", "Draft")).unwrap();

        let created = dispatch(
            &router,
            &mut db,
            Request::new(Method::POST, "/documents?include=ghost").with_body(r#"{"title":"New"}"#),
        );
        let updated = dispatch(
            &router,
            &mut db,
            Request::new(Method::PATCH, "/documents/1?include=folder.ghost")
                .with_body(r#"{"title":"Final"}"#),
        );

        assert_eq!(created.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(updated.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let documents = db.all("document").unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].attr_str("title"), Some("Draft"));
    }

    #[test]
    fn test_unrelated_query_keys_keep_include() {
        let (router, mut db) = setup();
        let folder = db.create("folder", &[], Attrs::new().with("name", "Notes")).unwrap();
        db.create_related(&folder.key(), "documents", Attrs::new()).unwrap();

        let response = dispatch(
            &router,
            &mut db,
            Request::new(Method::GET, "/folders?include=documents&page[size]=10"),
        );

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(&response)["included"][0]["type"], "documents");
    }

    #[test]
    fn test_non_flat_filter_is_400() {
        let (router, mut db) = setup();

        for path in [
            "/folders?include=documents&filter[name][eq]=Notes",
            "/folders?include=documents&filter=x",
        ] {
            let response = dispatch(&router, &mut db, Request::new(Method::GET, path));
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
        }
    }

    #[test]
    fn test_relationship_named_attribute_is_400() {
        let (router, mut db) = setup();
        db.create("folder", &[], Attrs::new()).unwrap();

        let response = dispatch(
            &router,
            &mut db,
            Request::new(Method::POST, "/documents").with_body(r#"{"title":"x","folder":"1"}"#),
        );

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(db.all("document").unwrap().is_empty());
    }

    #[test]
    fn test_explicit_status_on_empty_reply() {
        let (router, mut db) = setup();

        let response = dispatch(&router, &mut db, Request::new(Method::POST, "/jobs"));

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
