//! HTTP client with in-process interception.
//!
//! [`HttpClient::fetch`] sends each call either to a registered
//! [`MockServer`] (when the URL falls under its base) or to the network
//! through `reqwest`. Both paths return the same [`Response`] type.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::Serialize;
use url::Url;

use crate::dispatch::{self, Request};
use crate::error::{MockError, Result};
use crate::mock_server::MockServer;
use crate::request::JSONAPI_MEDIA_TYPE;
use crate::response::{Response, JSON_CONTENT_TYPE};

const USER_AGENT: &str = concat!("jsonapi-mock/", env!("CARGO_PKG_VERSION"));

/// An outgoing call: method, absolute URL, headers and optional body.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// Something that can carry a request and produce a response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutgoingRequest) -> Result<Response>;
}

#[async_trait]
impl Transport for MockServer {
    /// Answer in-process. Never fails: a URL outside the base becomes a 404.
    async fn send(&self, request: OutgoingRequest) -> Result<Response> {
        let Some(path) = self.route_path(&request.url) else {
            return Ok(dispatch::error_response(&MockError::RouteNotFound {
                method: request.method.to_string(),
                path: request.url.path().to_string(),
            }));
        };

        let mut dispatched = Request::new(request.method, &path).with_headers(request.headers);
        dispatched.body = request.body;
        Ok(self.handle(dispatched).await)
    }
}

/// The real network, via `reqwest`.
#[derive(Debug, Clone)]
pub struct NetworkTransport {
    http: Client,
}

impl NetworkTransport {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(MockError::HttpError)?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for NetworkTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<Response> {
        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder.send().await.map_err(MockError::HttpError)?;
        Response::from_reqwest(response).await
    }
}

/// Method, headers and body of a [`HttpClient::fetch`] call.
#[derive(Debug, Clone)]
pub struct RequestInit {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl Default for RequestInit {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

impl RequestInit {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Add a header. Invalid names or values are an error.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| MockError::MalformedBody(format!("header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| MockError::MalformedBody(format!("header value '{value}': {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Set a raw body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `body` as `application/json`.
    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self> {
        self.with_json(body, JSON_CONTENT_TYPE)
    }

    /// Serialize `body` as `application/vnd.api+json`.
    pub fn jsonapi<B: Serialize + ?Sized>(self, body: &B) -> Result<Self> {
        self.with_json(body, JSONAPI_MEDIA_TYPE)
    }

    fn with_json<B: Serialize + ?Sized>(mut self, body: &B, content_type: &'static str) -> Result<Self> {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.body = Some(serde_json::to_string(body)?);
        Ok(self)
    }
}

/// HTTP client that consults registered mock servers before the network.
///
/// Servers are tried in registration order; the first whose base covers the
/// URL answers. Cheap to clone.
///
/// # Example
///
/// ```no_run
/// use jsonapi_mock::{Fixtures, HttpClient};
///
/// # async fn example() -> jsonapi_mock::Result<()> {
/// let client = HttpClient::new()?.intercept(Fixtures::server()?);
/// let pong = client.get("https://api.test/ping").await?.text().await?;
/// assert_eq!(pong, "pong");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    network: NetworkTransport,
    servers: Vec<MockServer>,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            network: NetworkTransport::new()?,
            servers: Vec::new(),
        })
    }

    /// Route calls under `server`'s base URL to it.
    pub fn intercept(mut self, server: MockServer) -> Self {
        tracing::debug!(base = %server.base_url(), "intercepting");
        self.servers.push(server);
        self
    }

    /// Send a request, in-process when a server intercepts the URL.
    ///
    /// # Errors
    ///
    /// Only passthrough calls fail, with transport or URL errors; intercepted
    /// calls always produce a response.
    #[tracing::instrument(skip(self, init), fields(method = %init.method))]
    pub async fn fetch(&self, url: &str, init: RequestInit) -> Result<Response> {
        let url = Url::parse(url)?;
        let request = OutgoingRequest {
            method: init.method,
            url,
            headers: init.headers,
            body: init.body,
        };

        match self.servers.iter().find(|s| s.intercepts(&request.url)) {
            Some(server) => server.send(request).await,
            None => {
                tracing::debug!(url = %request.url, "passing through");
                self.network.send(request).await
            }
        }
    }

    /// `GET url`.
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.fetch(url, RequestInit::default()).await
    }
}
