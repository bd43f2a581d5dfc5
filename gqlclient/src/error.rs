//! GraphQL client error types.

use std::time::Duration;
use thiserror::Error;

use crate::GraphQLResponseError;

/// Result type for GraphQL client operations.
pub type Result<T> = std::result::Result<T, GraphQLError>;

/// Boxed error returned by injected capabilities (token providers, custom transports).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// GraphQL client errors.
#[derive(Debug, Error)]
pub enum GraphQLError {
    /// Variables were not a string-keyed map or a record.
    #[error("failed to validate operation variables: {0}")]
    InvalidVariables(String),

    /// The request envelope could not be serialized.
    #[error("failed to marshal request: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The transport could not complete the exchange.
    #[error("failed to do request: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a status other than 200 or 401.
    #[error("unexpected status code: {status}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, lossily decoded.
        body: String,
    },

    /// A 200 response body did not match the response envelope.
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The server reported GraphQL errors. Never empty.
    #[error("{}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLResponseError>),

    /// The token provider failed to produce a token.
    #[error("failed to get token: {0}")]
    TokenProvider(#[source] BoxError),

    /// The unauthorized-retry ceiling was exceeded.
    #[error("failed to retry, max retry count reached")]
    RetryExhausted {
        /// Number of resubmissions made before giving up.
        retries: u32,
        /// Token provider failure from the final attempt, which went out without a credential.
        #[source]
        token_error: Option<BoxError>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GraphQLError {
    /// Check if this is a network error.
    pub fn is_network_error(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Check if this is a GraphQL error (server-side).
    pub fn is_graphql_error(&self) -> bool {
        matches!(self, Self::GraphQL(_))
    }

    /// Check if the unauthorized-retry ceiling was reached.
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, Self::RetryExhausted { .. })
    }

    /// The token provider failure behind a retry-exhausted error, if any.
    pub fn token_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::TokenProvider(e) => Some(&**e),
            Self::RetryExhausted { token_error, .. } => token_error.as_deref(),
            _ => None,
        }
    }

    /// Get the HTTP status code if this is an unexpected-status error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get GraphQL errors if this is a GraphQL error.
    pub fn graphql_errors(&self) -> Option<&[GraphQLResponseError]> {
        match self {
            Self::GraphQL(errors) => Some(errors),
            _ => None,
        }
    }

    /// Get the first GraphQL error, the one this error reports.
    pub fn first_graphql_error(&self) -> Option<&GraphQLResponseError> {
        self.graphql_errors().and_then(|errors| errors.first())
    }
}

fn format_graphql_errors(errors: &[GraphQLResponseError]) -> String {
    match errors {
        [] => "server failure".to_string(),
        [first] => first.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The attempt did not finish within its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection could not be established.
    #[error("connection error: {0}")]
    Connection(String),

    /// The request could not be turned into a wire request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Underlying reqwest error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Error from a custom transport.
    #[error("{0}")]
    Other(#[source] BoxError),
}

impl TransportError {
    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_)) || matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Check if this is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_)) || matches!(self, Self::Http(e) if e.is_connect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error(message: &str) -> GraphQLResponseError {
        GraphQLResponseError {
            message: message.to_string(),
            locations: Vec::new(),
            path: Vec::new(),
            extensions: None,
        }
    }

    #[test]
    fn test_graphql_error_displays_first_message() {
        let err = GraphQLError::GraphQL(vec![server_error("not found")]);
        assert_eq!(err.to_string(), "not found");

        let err = GraphQLError::GraphQL(vec![server_error("first"), server_error("second")]);
        assert_eq!(err.to_string(), "first (and 1 more)");
        assert_eq!(err.first_graphql_error().unwrap().message, "first");
        assert_eq!(err.graphql_errors().unwrap().len(), 2);
    }

    #[test]
    fn test_error_predicates() {
        let err = GraphQLError::UnexpectedStatus {
            status: 500,
            body: String::new(),
        };
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(err.to_string(), "unexpected status code: 500");
        assert!(!err.is_network_error());

        let err = GraphQLError::from(TransportError::Timeout(Duration::from_secs(1)));
        assert!(err.is_network_error());
        assert!(err.is_timeout());

        let err = GraphQLError::RetryExhausted {
            retries: 3,
            token_error: None,
        };
        assert!(err.is_retry_exhausted());
        assert_eq!(err.to_string(), "failed to retry, max retry count reached");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_token_provider_error_display() {
        let err = GraphQLError::TokenProvider("vault sealed".into());
        assert_eq!(err.to_string(), "failed to get token: vault sealed");
        assert_eq!(err.token_error().unwrap().to_string(), "vault sealed");

        let err = GraphQLError::RetryExhausted {
            retries: 3,
            token_error: Some("vault sealed".into()),
        };
        assert_eq!(err.token_error().unwrap().to_string(), "vault sealed");
        assert_eq!(std::error::Error::source(&err).unwrap().to_string(), "vault sealed");
    }
}
