//! What route handlers receive and return.

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{MockError, Result};
use crate::factory::{AttrValue, Attrs};
use crate::routes::Params;
use crate::schema::Schema;
use crate::store::RecordKey;

/// JSON:API media type.
pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

/// `filter[...]` part of a query string.
#[derive(Debug, Default, Deserialize)]
struct FilterQuery {
    #[serde(default)]
    filter: BTreeMap<String, String>,
}

/// Parsed query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
    include: Vec<String>,
    filter: Vec<(String, String)>,
}

impl QueryParams {
    /// Parse a raw query string (without the leading `?`).
    ///
    /// Keys other than `include` and `filter` are kept as plain pairs. A
    /// `filter` that isn't a flat `filter[name]=value` map is an error.
    pub fn parse(query: &str) -> Result<Self> {
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let include = pairs
            .iter()
            .filter(|(k, _)| k == "include")
            .flat_map(|(_, v)| v.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let filter_query: String = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs.iter().filter(|(k, _)| is_filter_key(k)))
            .finish();
        let filter: FilterQuery = serde_qs::Config::new(5, false)
            .deserialize_str(&filter_query)
            .map_err(|e| MockError::MalformedQuery(format!("filter: {e}")))?;

        Ok(Self {
            pairs,
            include,
            filter: filter.filter.into_iter().collect(),
        })
    }

    /// First value of a query parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Relationship paths from `include=a,b.c`.
    pub fn include(&self) -> &[String] {
        &self.include
    }

    /// Attribute filters from `filter[name]=value`.
    pub fn filter(&self) -> &[(String, String)] {
        &self.filter
    }
}

fn is_filter_key(key: &str) -> bool {
    key == "filter" || key.starts_with("filter[")
}

/// A request as seen by a route handler.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub method: Method,
    /// Path relative to the server's base URL.
    pub path: String,
    pub params: Params,
    pub query: QueryParams,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl HandlerRequest {
    /// A path parameter bound by the route pattern.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Whether the request declares the JSON:API media type.
    pub fn is_jsonapi(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with(JSONAPI_MEDIA_TYPE))
            .unwrap_or(false)
    }

    /// The body parsed as JSON.
    pub fn json_body(&self) -> Result<Value> {
        let body = self
            .body
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| MockError::MalformedBody("request body is required".to_string()))?;
        serde_json::from_str(body).map_err(|e| MockError::MalformedBody(e.to_string()))
    }

    /// Normalize the body into attributes for `model`.
    ///
    /// JSON:API bodies contribute `data.attributes` and `data.relationships`;
    /// any other content type is read as a flat attributes object.
    pub fn attrs(&self, schema: &Schema, model: &str) -> Result<Attrs> {
        let body = self.json_body()?;
        if self.is_jsonapi() {
            jsonapi_attrs(schema, model, body)
        } else {
            match body {
                Value::Object(_) => Ok(Attrs::from_json(body)),
                other => Err(MockError::MalformedBody(format!(
                    "expected a JSON object, got {other}"
                ))),
            }
        }
    }
}

fn jsonapi_attrs(schema: &Schema, model: &str, body: Value) -> Result<Attrs> {
    let Value::Object(mut document) = body else {
        return Err(MockError::MalformedBody("expected a JSON:API document".to_string()));
    };
    let Some(Value::Object(mut data)) = document.remove("data") else {
        return Err(MockError::MalformedBody("missing 'data' object".to_string()));
    };

    if let Some(type_name) = data.get("type").and_then(Value::as_str) {
        if schema.get_by_type(type_name)?.name != model {
            return Err(MockError::MalformedBody(format!(
                "type '{type_name}' does not match this endpoint"
            )));
        }
    }

    let mut attrs = match data.remove("attributes") {
        Some(attributes @ Value::Object(_)) => Attrs::from_json(attributes),
        None | Some(Value::Null) => Attrs::new(),
        Some(other) => {
            return Err(MockError::MalformedBody(format!(
                "'attributes' must be an object, got {other}"
            )))
        }
    };

    if let Some(Value::Object(relationships)) = data.remove("relationships") {
        for (name, relationship) in relationships {
            let linkage = relationship.get("data").cloned().unwrap_or(Value::Null);
            let value = match linkage {
                Value::Null => AttrValue::Value(Value::Null),
                Value::Array(items) => AttrValue::Records(
                    items
                        .iter()
                        .map(|item| identifier(schema, item))
                        .collect::<Result<_>>()?,
                ),
                item @ Value::Object(_) => AttrValue::Record(identifier(schema, &item)?),
                other => {
                    return Err(MockError::MalformedBody(format!(
                        "invalid linkage for '{name}': {other}"
                    )))
                }
            };
            attrs.set(&name, value);
        }
    }

    Ok(attrs)
}

fn identifier(schema: &Schema, item: &Value) -> Result<RecordKey> {
    let type_name = item.get("type").and_then(Value::as_str);
    let id = match item.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    match (type_name, id) {
        (Some(type_name), Some(id)) => Ok(RecordKey::new(&schema.get_by_type(type_name)?.name, &id)),
        _ => Err(MockError::MalformedBody(format!(
            "resource identifier needs 'type' and 'id': {item}"
        ))),
    }
}

/// What a handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Serialized as a JSON:API document with a single resource.
    Record(RecordKey),
    /// Serialized as a JSON:API document with a list of resources.
    Collection(Vec<RecordKey>),
    /// Arbitrary JSON, sent as-is.
    Json(Value),
    /// Plain text.
    Text(String),
    /// No body.
    Empty,
}

/// A handler result: payload plus an optional explicit status.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: Option<StatusCode>,
    pub payload: Payload,
}

impl Reply {
    pub fn new(payload: Payload) -> Self {
        Self {
            status: None,
            payload,
        }
    }

    pub fn record(key: RecordKey) -> Self {
        Self::new(Payload::Record(key))
    }

    pub fn collection(keys: Vec<RecordKey>) -> Self {
        Self::new(Payload::Collection(keys))
    }

    pub fn json(value: Value) -> Self {
        Self::new(Payload::Json(value))
    }

    pub fn text(text: &str) -> Self {
        Self::new(Payload::Text(text.to_string()))
    }

    pub fn empty() -> Self {
        Self::new(Payload::Empty)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }
}
