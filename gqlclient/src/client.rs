//! GraphQL client implementation.

use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue};
use http::{Method, StatusCode, Uri};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::TokenCache;
use crate::request::GraphQLRequest;
use crate::retry::{RetryController, RetryDecision};
use crate::{
    BoxError, GraphQLClientConfig, GraphQLError, GraphQLResponse, MutationBuilder, OperationKind,
    QueryBuilder, ReqwestTransport, Result, TokenProvider, Transport, TransportError,
};

/// GraphQL client.
///
/// Cheap to clone; clones share the transport, the cached token and the
/// retry state.
#[derive(Clone)]
pub struct GraphQLClient {
    endpoint: Uri,
    config: Arc<GraphQLClientConfig>,
    transport: Arc<dyn Transport>,
    token_provider: Option<Arc<dyn TokenProvider>>,
    tokens: Arc<TokenCache>,
    retries: Arc<RetryController>,
}

impl GraphQLClient {
    /// Create a new GraphQL client with the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_config(GraphQLClientConfig::new(endpoint))
    }

    /// Create a new GraphQL client with custom configuration and the default reqwest transport.
    pub fn with_config(config: GraphQLClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::with_user_agent(&config.user_agent)
            .map_err(|e| GraphQLError::Config(format!("failed to build HTTP client: {}", e)))?;
        Self::with_transport(config, transport)
    }

    /// Create a new GraphQL client that sends requests through `transport`.
    ///
    /// The endpoint may be relative (e.g. `/query`) if the transport accepts that.
    pub fn with_transport(
        config: GraphQLClientConfig,
        transport: impl Transport + 'static,
    ) -> Result<Self> {
        let endpoint: Uri = config
            .endpoint
            .parse()
            .map_err(|e| GraphQLError::Config(format!("invalid endpoint {:?}: {}", config.endpoint, e)))?;

        Ok(Self {
            endpoint,
            retries: Arc::new(RetryController::new(config.max_retries, config.retry_scope)),
            config: Arc::new(config),
            transport: Arc::new(transport),
            token_provider: None,
            tokens: Arc::new(TokenCache::default()),
        })
    }

    /// Obtain bearer tokens from `provider` whenever none is cached.
    ///
    /// Unless [`require_token`](GraphQLClientConfig::require_token) is set, a
    /// provider failure is logged and the attempt goes out without a token. If
    /// the server then keeps answering `401`, the resulting
    /// [`GraphQLError::RetryExhausted`] carries the last provider failure as its
    /// source (see [`GraphQLError::token_error`]).
    pub fn token_provider(mut self, provider: impl TokenProvider + 'static) -> Self {
        self.token_provider = Some(Arc::new(provider));
        self
    }

    /// Seed the token cache. Cleared like any other token on `401`.
    pub fn bearer_token(self, token: impl Into<String>) -> Self {
        self.tokens.set(token);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &GraphQLClientConfig {
        &self.config
    }

    /// Get the parsed endpoint.
    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    /// Check if a bearer token is currently cached.
    pub fn has_token(&self) -> bool {
        self.tokens.current().is_some()
    }

    /// Replace the cached token.
    pub fn set_token(&self, token: impl Into<String>) {
        self.tokens.set(token);
    }

    /// Forget the cached token; the next call asks the provider again.
    pub fn clear_token(&self) {
        self.tokens.clear();
    }

    /// Create a query builder.
    pub fn query(&self, query: impl Into<String>) -> QueryBuilder<'_> {
        QueryBuilder::new(self, OperationKind::Query, query)
    }

    /// Create a mutation builder.
    pub fn mutation(&self, mutation: impl Into<String>) -> MutationBuilder<'_> {
        MutationBuilder::new(self, mutation)
    }

    /// Run a query with `variables` and decode `data` into `T`.
    pub async fn execute_query<V, T>(&self, query: &str, variables: &V) -> Result<T>
    where
        V: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.query(query).variables(variables).send().await
    }

    /// Run a mutation with `variables` and decode `data` into `T`.
    pub async fn execute_mutation<V, T>(&self, mutation: &str, variables: &V) -> Result<T>
    where
        V: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.mutation(mutation).variables(variables).send().await
    }

    /// Execute a single request, resubmitting on `401` up to the retry ceiling.
    pub(crate) async fn execute_request(
        &self,
        request: GraphQLRequest,
        extra_headers: Vec<(String, String)>,
        timeout: Option<Duration>,
    ) -> Result<GraphQLResponse<Value>> {
        let body = Bytes::from(request.to_body()?);
        let timeout = timeout.unwrap_or(self.config.timeout);
        let mut call_retries = 0;
        let mut token_error = None;

        loop {
            let token = self.current_token(&mut token_error).await?;
            let http_request = self.build_http_request(body.clone(), token.as_deref(), &extra_headers)?;

            debug!(
                operation = %request.kind,
                attempt = call_retries + 1,
                authorized = token.is_some(),
                "Executing GraphQL request"
            );

            let response = tokio::time::timeout(timeout, self.transport.execute(http_request))
                .await
                .map_err(|_| TransportError::Timeout(timeout))??;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                if let Some(token) = &token {
                    self.tokens.invalidate(token);
                }
                match self.retries.on_unauthorized(&mut call_retries) {
                    RetryDecision::Retry { retry } => {
                        warn!(
                            operation = %request.kind,
                            retry,
                            max_retries = self.retries.max_retries(),
                            "Unauthorized, retrying with a fresh token"
                        );
                        continue;
                    }
                    RetryDecision::Exhausted { retries } => {
                        debug!(
                            operation = %request.kind,
                            retries,
                            scope = ?self.retries.scope(),
                            "Unauthorized retry budget exhausted"
                        );
                        return Err(GraphQLError::RetryExhausted { retries, token_error });
                    }
                }
            }

            if status != StatusCode::OK {
                return Err(GraphQLError::UnexpectedStatus {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(response.body()).into_owned(),
                });
            }

            return serde_json::from_slice(response.body()).map_err(GraphQLError::Decode);
        }
    }

    /// The token to attach, refreshing from the provider if none is cached.
    ///
    /// A provider failure this attempt is sent without a token lands in `failure`.
    async fn current_token(&self, failure: &mut Option<BoxError>) -> Result<Option<String>> {
        *failure = None;
        match self.tokens.get_or_refresh(self.token_provider.as_deref()).await {
            Ok(Some(token)) => Ok(Some(token)),
            Ok(None) if self.config.require_token => {
                Err(GraphQLError::TokenProvider("no token available".into()))
            }
            Ok(None) => Ok(None),
            Err(e) if self.config.require_token => Err(GraphQLError::TokenProvider(e)),
            Err(e) => {
                warn!(error = %e, "Token provider failed, sending request without a token");
                *failure = Some(e);
                Ok(None)
            }
        }
    }

    fn build_http_request(
        &self,
        body: Bytes,
        token: Option<&str>,
        extra_headers: &[(String, String)],
    ) -> Result<http::Request<Bytes>> {
        let mut request = http::Request::new(body);
        *request.method_mut() = Method::POST;
        *request.uri_mut() = self.endpoint.clone();

        let headers = request.headers_mut();
        for (name, value) in self.config.default_headers.iter().chain(extra_headers) {
            headers.append(
                HeaderName::try_from(name.as_str())
                    .map_err(|e| GraphQLError::Config(format!("invalid header name {:?}: {}", name, e)))?,
                HeaderValue::try_from(value.as_str())
                    .map_err(|e| GraphQLError::Config(format!("invalid value for header {:?}: {}", name, e)))?,
            );
        }

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = token {
            let mut value = HeaderValue::try_from(format!("Bearer {}", token)).map_err(|_| {
                GraphQLError::TokenProvider("token is not a valid header value".into())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(request)
    }
}

impl fmt::Debug for GraphQLClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQLClient")
            .field("endpoint", &self.endpoint)
            .field("config", &self.config)
            .field("has_token_provider", &self.token_provider.is_some())
            .field("tokens", &self.tokens)
            .finish()
    }
}
