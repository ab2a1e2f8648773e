//! Response objects returned to callers.
//!
//! Intercepted and passed-through calls both come back as a [`Response`], so
//! response-handling code cannot tell them apart.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::{MockError, Result};

/// Content type for JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Content type for plain-text bodies.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// A completed HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// A response with a body and a single content-type header.
    pub fn with_body(status: StatusCode, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        Self::new(status, headers, body.into())
    }

    /// A response with no body and no headers.
    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, HeaderMap::new(), Vec::new())
    }

    /// Buffer a network response.
    pub async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(MockError::HttpError)?;
        Ok(Self::new(status, headers, body.to_vec()))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The `content-type` header, if present and readable.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// The body as text. Invalid UTF-8 is replaced.
    pub async fn text(self) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.body).into_owned())
    }

    /// The body parsed as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[tokio::test]
    async fn test_json_body() {
        let response = Response::with_body(StatusCode::OK, JSON_CONTENT_TYPE, r#"{"result":"pong"}"#);

        assert_eq!(response.content_type(), Some(JSON_CONTENT_TYPE));
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["result"], "pong");
    }

    #[test]
    fn test_empty_response_has_no_body() {
        let response = Response::empty(StatusCode::NO_CONTENT);

        assert!(response.content_type().is_none());
        assert_eq!(tokio_test::block_on(response.text()).unwrap(), "");
    }
}
