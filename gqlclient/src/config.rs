//! GraphQL client configuration.

use std::env;
use std::time::Duration;

use crate::retry::{DEFAULT_MAX_RETRIES, RetryScope};
use crate::{GraphQLError, Result};

/// GraphQL client configuration.
#[derive(Debug, Clone)]
pub struct GraphQLClientConfig {
    /// GraphQL endpoint URL.
    pub endpoint: String,
    /// Timeout for each attempt, retries included.
    pub timeout: Duration,
    /// Default headers for all requests.
    pub default_headers: Vec<(String, String)>,
    /// User agent string.
    pub user_agent: String,
    /// Maximum resubmissions after a `401`.
    pub max_retries: u32,
    /// Whether the retry budget is per call or shared by the client.
    pub retry_scope: RetryScope,
    /// Fail the call when the token provider fails, instead of sending without a token.
    pub require_token: bool,
}

impl Default for GraphQLClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4000/graphql".to_string(),
            timeout: Duration::from_secs(30),
            default_headers: Vec::new(),
            user_agent: format!("gqlclient/{}", env!("CARGO_PKG_VERSION")),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_scope: RetryScope::default(),
            require_token: false,
        }
    }
}

impl GraphQLClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> GraphQLClientConfigBuilder {
        GraphQLClientConfigBuilder::default()
    }

    /// Create configuration for a specific endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Load configuration from `<PREFIX>_*` environment variables.
    ///
    /// `<PREFIX>_ENDPOINT` is required. Optional: `_TIMEOUT_SECS`,
    /// `_MAX_RETRIES`, `_USER_AGENT`, `_RETRY_SCOPE` (`per-call` | `shared`),
    /// `_REQUIRE_TOKEN` (`true` | `false` | `1` | `0`).
    pub fn from_env(prefix: &str) -> Result<Self> {
        Self::from_lookup(prefix, |key| env::var(key).ok())
    }

    fn from_lookup(prefix: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(&format!("{}_{}", prefix, name));

        let endpoint = var("ENDPOINT").ok_or_else(|| {
            GraphQLError::Config(format!("{}_ENDPOINT is not set", prefix))
        })?;
        let mut config = Self::new(endpoint);

        if let Some(secs) = var("TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_var(prefix, "TIMEOUT_SECS", &secs)?);
        }
        if let Some(retries) = var("MAX_RETRIES") {
            config.max_retries = parse_var(prefix, "MAX_RETRIES", &retries)?;
        }
        if let Some(user_agent) = var("USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(scope) = var("RETRY_SCOPE") {
            config.retry_scope = scope.parse()?;
        }
        if let Some(required) = var("REQUIRE_TOKEN") {
            config.require_token = match required.to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(GraphQLError::Config(format!(
                        "{}_REQUIRE_TOKEN: expected a boolean, got {:?}",
                        prefix, required
                    )));
                }
            };
        }

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(prefix: &str, name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| GraphQLError::Config(format!("{}_{}: {}", prefix, name, e)))
}

/// Builder for GraphQL client configuration.
#[derive(Debug, Default)]
pub struct GraphQLClientConfigBuilder {
    config: GraphQLClientConfig,
}

impl GraphQLClientConfigBuilder {
    /// Set the GraphQL endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Set the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add a default header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config
            .default_headers
            .push((name.into(), value.into()));
        self
    }

    /// Set user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the maximum resubmissions after a `401`.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the retry budget scope.
    pub fn retry_scope(mut self, scope: RetryScope) -> Self {
        self.config.retry_scope = scope;
        self
    }

    /// Abort calls when the token provider fails.
    pub fn require_token(mut self, required: bool) -> Self {
        self.config.require_token = required;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GraphQLClientConfig {
        self.config
    }
}
