//! Error types for mock server operations.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while defining, seeding or dispatching against the mock server.
#[derive(Debug, Error)]
pub enum MockError {
    /// Configuration is missing or incomplete.
    #[error("mock server configuration required: {0}")]
    ConfigMissing(String),

    /// Model name not present in the schema.
    #[error("unknown model '{0}'")]
    UnknownModel(String),

    /// Trait name not declared on the model's factory.
    #[error("unknown trait '{trait_name}' for factory '{model}'")]
    UnknownTrait { model: String, trait_name: String },

    /// Relationship name not declared on the model.
    #[error("model '{model}' has no relationship '{relationship}'")]
    UnknownRelationship { model: String, relationship: String },

    /// A record of the wrong model was assigned to a relationship.
    #[error("relationship '{model}.{relationship}' expects '{expected}' records, got '{actual}'")]
    TypeMismatch {
        model: String,
        relationship: String,
        expected: String,
        actual: String,
    },

    /// Factory definition is inconsistent.
    #[error("invalid factory for '{model}': {message}")]
    InvalidFactory { model: String, message: String },

    /// Record not found in the store.
    #[error("{model} '{id}' not found")]
    RecordNotFound { model: String, id: String },

    /// No route matches the verb and path.
    #[error("no route for {method} {path}")]
    RouteNotFound { method: String, path: String },

    /// Route declaration cannot be resolved.
    #[error("invalid route: {0}")]
    InvalidRoute(String),

    /// Request body is required but could not be interpreted.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// Query string has a shape handlers can't use.
    #[error("malformed query string: {0}")]
    MalformedQuery(String),

    /// HTTP transport error on a passthrough request.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// Scenario file could not be read.
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
}

impl MockError {
    /// Status code a dispatched request reports when it fails with this error.
    pub fn status(&self) -> StatusCode {
        match self {
            MockError::RouteNotFound { .. } | MockError::RecordNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            MockError::MalformedBody(_) | MockError::MalformedQuery(_) | MockError::ParseError(_) => {
                StatusCode::BAD_REQUEST
            }
            MockError::UnknownModel(_)
            | MockError::UnknownRelationship { .. }
            | MockError::TypeMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type alias for mock server operations.
pub type Result<T> = core::result::Result<T, MockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_errors_map_to_404() {
        let route = MockError::RouteNotFound {
            method: "GET".to_string(),
            path: "/nope".to_string(),
        };
        let record = MockError::RecordNotFound {
            model: "document".to_string(),
            id: "9".to_string(),
        };

        assert_eq!(route.status(), StatusCode::NOT_FOUND);
        assert_eq!(record.status(), StatusCode::NOT_FOUND);
        assert_eq!(record.to_string(), "document '9' not found");
    }

    #[test]
    fn test_body_errors_map_to_client_errors() {
        assert_eq!(
            MockError::MalformedBody("x".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            MockError::MalformedQuery("x".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            MockError::UnknownModel("ghost".to_string()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
