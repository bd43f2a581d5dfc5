//! # gqlclient
//!
//! A GraphQL-over-HTTP client for queries and mutations, with pluggable
//! transport, pluggable bearer-token supply and a bounded retry when the
//! server answers `401 Unauthorized`.
//!
//! ## Features
//!
//! - **Typed round trips**: serialize any map or struct as variables, decode `data` into any `Deserialize` type
//! - **Validation before I/O**: variables that are not a string-keyed map or a struct never reach the network
//! - **Token refresh**: a [`TokenProvider`] is asked for a token whenever none is cached
//! - **Bounded auth retry**: a `401` clears the token and resubmits, at most `max_retries` times
//! - **Pluggable transport**: reqwest by default, anything implementing [`Transport`] otherwise
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gqlclient::{GraphQLClient, StaticToken};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct CountryVars<'a> {
//!     code: &'a str,
//! }
//!
//! #[derive(Deserialize)]
//! struct Country {
//!     name: String,
//!     capital: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct CountryResponse {
//!     country: Country,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GraphQLClient::new("https://countries.trevorblades.com/")?
//!         .token_provider(StaticToken::new("secret"));
//!
//!     let response: CountryResponse = client
//!         .query("query Country($code: ID!) { country(code: $code) { name capital } }")
//!         .variables(&CountryVars { code: "AL" })
//!         .send()
//!         .await?;
//!
//!     println!("{} ({})", response.country.name, response.country.capital);
//!     Ok(())
//! }
//! ```
//!
//! ## Error handling
//!
//! Every call returns a single [`GraphQLError`] describing the first failure:
//! invalid variables, transport failure, unexpected HTTP status, undecodable
//! body, server-reported GraphQL errors, token provider failure, or an
//! exhausted unauthorized-retry budget. The client stays usable after any of them.

mod auth;
mod client;
mod config;
mod error;
mod request;
mod response;
mod retry;
mod transport;
mod variables;

pub use auth::{StaticToken, TokenFn, TokenProvider, token_fn};
pub use client::GraphQLClient;
pub use config::{GraphQLClientConfig, GraphQLClientConfigBuilder};
pub use error::{BoxError, GraphQLError, Result, TransportError};
pub use request::{GraphQLRequest, MutationBuilder, OperationKind, QueryBuilder};
pub use response::{ErrorLocation, GraphQLResponse, GraphQLResponseError, PathSegment, format_path};
pub use retry::{DEFAULT_MAX_RETRIES, RetryScope};
pub use transport::{ReqwestTransport, Transport};
pub use variables::{Variables, VariablesShape, validate as validate_variables};

// Re-export common types
pub use serde_json::Value as JsonValue;
