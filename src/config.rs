//! Server configuration.
//!
//! The intercepted base URL is `url_prefix` followed by `namespace`. Both can be
//! set in code or read from environment variables.

use std::env;

use url::Url;

use crate::error::Result;

const DEFAULT_URL_PREFIX: &str = "https://api.test";

/// Configuration for a mock server instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Scheme and host the interceptor listens on (e.g. `https://api.test`).
    pub url_prefix: String,
    /// Path prefix shared by all routes (e.g. `/api/v1`). Empty by default.
    pub namespace: String,
    /// Log every handled request at info level instead of debug.
    pub logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
            namespace: String::new(),
            logging: false,
        }
    }
}

impl ServerConfig {
    /// Build a configuration from environment variables.
    ///
    /// - `MOCK_API_URL` (optional) - URL prefix (defaults to `https://api.test`)
    /// - `MOCK_API_NAMESPACE` (optional) - route namespace
    /// - `MOCK_API_LOGGING` (optional) - `1`/`true` enables request logging
    ///
    /// # Errors
    ///
    /// Returns an error if `MOCK_API_URL` is not a valid absolute URL.
    pub fn from_env() -> Result<Self> {
        let url_prefix = env::var("MOCK_API_URL").unwrap_or_else(|_| DEFAULT_URL_PREFIX.to_string());
        let namespace = env::var("MOCK_API_NAMESPACE").unwrap_or_default();
        let logging = env::var("MOCK_API_LOGGING")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Url::parse(&url_prefix)?;

        Ok(Self {
            url_prefix,
            namespace,
            logging,
        }
        .normalized())
    }

    /// Set the URL prefix.
    pub fn with_url_prefix(mut self, url_prefix: &str) -> Self {
        self.url_prefix = url_prefix.to_string();
        self.normalized()
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self.normalized()
    }

    /// Enable or disable request logging.
    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    /// The full base URL requests must start with to be intercepted.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.url_prefix, self.namespace)
    }

    /// Strip trailing slashes from the prefix and force a leading slash on the namespace.
    fn normalized(mut self) -> Self {
        while self.url_prefix.ends_with('/') {
            self.url_prefix.pop();
        }
        let trimmed = self.namespace.trim_matches('/');
        self.namespace = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        };
        self
    }
}
