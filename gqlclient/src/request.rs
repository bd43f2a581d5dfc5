//! GraphQL request builders.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::{GraphQLClient, GraphQLError, GraphQLResponse, Result, Variables};

/// Whether an operation is a query or a mutation.
///
/// Only used for logging; the server infers the kind from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// A read operation.
    Query,
    /// A write operation.
    Mutation,
}

impl OperationKind {
    /// Lowercase name, as written in a GraphQL document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GraphQL request envelope.
///
/// Serializes as `{"query": ..., "variables": ...}`, plus `operationName`
/// when one is set.
#[derive(Debug, Clone, Serialize)]
pub struct GraphQLRequest {
    /// Query or mutation. Not sent.
    #[serde(skip)]
    pub kind: OperationKind,
    /// The GraphQL document.
    pub query: String,
    /// Operation name (for documents with multiple operations).
    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    /// Variables for the operation.
    pub variables: Variables,
}

impl GraphQLRequest {
    /// Create a new request with no variables.
    pub fn new(kind: OperationKind, query: impl Into<String>) -> Self {
        Self {
            kind,
            query: query.into(),
            operation_name: None,
            variables: Variables::empty(),
        }
    }

    /// Create a query request.
    pub fn query(query: impl Into<String>) -> Self {
        Self::new(OperationKind::Query, query)
    }

    /// Create a mutation request.
    pub fn mutation(mutation: impl Into<String>) -> Self {
        Self::new(OperationKind::Mutation, mutation)
    }

    /// Set the operation name.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Validate and set variables.
    pub fn variables<T: Serialize + ?Sized>(mut self, variables: &T) -> Result<Self> {
        self.variables = Variables::from_serialize(variables)?;
        Ok(self)
    }

    /// Serialize to the JSON wire body.
    pub fn to_body(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(GraphQLError::Serialize)
    }
}

/// Query builder for GraphQL queries.
pub struct QueryBuilder<'a> {
    client: &'a GraphQLClient,
    request: GraphQLRequest,
    timeout: Option<Duration>,
    headers: Vec<(String, String)>,
    // First builder error, reported by `send` before any I/O.
    invalid: Option<GraphQLError>,
}

impl<'a> QueryBuilder<'a> {
    pub(crate) fn new(
        client: &'a GraphQLClient,
        kind: OperationKind,
        query: impl Into<String>,
    ) -> Self {
        Self {
            client,
            request: GraphQLRequest::new(kind, query),
            timeout: None,
            headers: Vec::new(),
            invalid: None,
        }
    }

    /// Set the operation name.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.request.operation_name = Some(name.into());
        self
    }

    /// Set variables: a string-keyed map or a struct.
    ///
    /// Any other shape makes `send` fail with
    /// [`GraphQLError::InvalidVariables`] without contacting the server.
    pub fn variables<T: Serialize + ?Sized>(mut self, variables: &T) -> Self {
        match Variables::from_serialize(variables) {
            Ok(variables) => self.request.variables = variables,
            Err(e) => self.fail(e),
        }
        self
    }

    /// Set a single variable.
    pub fn variable(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => self.request.variables.insert(name, value),
            Err(e) => self.fail(GraphQLError::Serialize(e)),
        }
        self
    }

    /// Set a custom timeout for each attempt of this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add a header for this request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    fn fail(&mut self, error: GraphQLError) {
        self.invalid.get_or_insert(error);
    }

    /// Execute and return the decoded envelope, GraphQL errors included.
    ///
    /// HTTP-level failures, exhausted retries and undecodable bodies are still
    /// errors; a non-empty `errors` list is not.
    pub async fn send_raw(self) -> Result<GraphQLResponse<Value>> {
        if let Some(error) = self.invalid {
            return Err(error);
        }
        self.client
            .execute_request(self.request, self.headers, self.timeout)
            .await
    }

    /// Execute and deserialize `data` into `T`.
    ///
    /// Fails with the server's errors if the response carried any, even when
    /// `data` was also present.
    pub async fn send<T: DeserializeOwned>(self) -> Result<T> {
        self.send_raw().await?.into_result()
    }

    /// Execute and write `data` into a caller-owned target.
    ///
    /// The target is left untouched on error.
    pub async fn send_into<T: DeserializeOwned>(self, target: &mut T) -> Result<()> {
        *target = self.send().await?;
        Ok(())
    }
}

/// Mutation builder for GraphQL mutations.
pub struct MutationBuilder<'a> {
    inner: QueryBuilder<'a>,
}

impl<'a> MutationBuilder<'a> {
    pub(crate) fn new(client: &'a GraphQLClient, mutation: impl Into<String>) -> Self {
        Self {
            inner: QueryBuilder::new(client, OperationKind::Mutation, mutation),
        }
    }

    /// Set the operation name.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.inner = self.inner.operation_name(name);
        self
    }

    /// Set variables: a string-keyed map or a struct.
    pub fn variables<T: Serialize + ?Sized>(mut self, variables: &T) -> Self {
        self.inner = self.inner.variables(variables);
        self
    }

    /// Set a single variable.
    pub fn variable(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        self.inner = self.inner.variable(name, value);
        self
    }

    /// Set a custom timeout for each attempt of this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.timeout(timeout);
        self
    }

    /// Add a header for this request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner = self.inner.header(name, value);
        self
    }

    /// Execute the mutation and return the decoded envelope.
    pub async fn send_raw(self) -> Result<GraphQLResponse<Value>> {
        self.inner.send_raw().await
    }

    /// Execute the mutation and deserialize `data` into `T`.
    pub async fn send<T: DeserializeOwned>(self) -> Result<T> {
        self.inner.send().await
    }

    /// Execute the mutation and write `data` into a caller-owned target.
    pub async fn send_into<T: DeserializeOwned>(self, target: &mut T) -> Result<()> {
        self.inner.send_into(target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_body_omits_kind() {
        let request = GraphQLRequest::mutation("mutation { reset }");
        let body: Value = serde_json::from_slice(&request.to_body().unwrap()).unwrap();
        assert_eq!(body, json!({"query": "mutation { reset }", "variables": {}}));
    }

    #[test]
    fn test_wire_body_with_variables_and_name() {
        let request = GraphQLRequest::query("query Country($code: ID!) { country(code: $code) { name } }")
            .operation_name("Country")
            .variables(&json!({"code": "AL"}))
            .unwrap();

        let body: Value = serde_json::from_slice(&request.to_body().unwrap()).unwrap();
        assert_eq!(body["operationName"], "Country");
        assert_eq!(body["variables"], json!({"code": "AL"}));
        assert!(body.get("kind").is_none());
    }

    #[test]
    fn test_invalid_variables() {
        let err = GraphQLRequest::query("{ a }").variables(&[1, 2]).unwrap_err();
        assert!(matches!(err, GraphQLError::InvalidVariables(_)));
    }

    #[test]
    fn test_operation_kind_display() {
        assert_eq!(OperationKind::Query.to_string(), "query");
        assert_eq!(OperationKind::Mutation.as_str(), "mutation");
    }
}
