//! GraphQL response types.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{GraphQLError, Result};

/// GraphQL response envelope as received from the server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphQLResponse<T = Value> {
    /// The data returned by the query/mutation.
    #[serde(default)]
    pub data: Option<T>,
    /// Errors returned by the server, in server order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<GraphQLResponseError>,
    /// Extensions (for tracing, caching info, etc.).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl<T> GraphQLResponse<T> {
    /// Check if the response has errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get the errors.
    pub fn errors(&self) -> &[GraphQLResponseError] {
        &self.errors
    }

    /// Get the data, ignoring any errors.
    pub fn data(self) -> Option<T> {
        self.data
    }
}

impl GraphQLResponse<Value> {
    /// Decode `data` into `T`, failing on the server's errors first.
    ///
    /// A non-empty error list wins even when `data` is also present. An absent
    /// or null `data` is decoded as JSON `null`, so `Option<_>` and `()` targets
    /// accept it while record targets report a decode error.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T> {
        if !self.errors.is_empty() {
            return Err(GraphQLError::GraphQL(self.errors));
        }
        let data = self.data.unwrap_or(Value::Null);
        if data.is_null() {
            return serde_json::from_value(Value::Null).map_err(|_| {
                GraphQLError::Decode(serde_json::Error::custom("response contained no data"))
            });
        }
        serde_json::from_value(data).map_err(GraphQLError::Decode)
    }
}

/// A GraphQL error from the server.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GraphQLResponseError {
    /// Error message.
    pub message: String,
    /// Locations in the query where the error occurred.
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub locations: Vec<ErrorLocation>,
    /// Path to the field that caused the error.
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub path: Vec<PathSegment>,
    /// Server-specific extensions, passed through uninterpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

/// Servers send `null` and omit fields interchangeably.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl GraphQLResponseError {
    /// Dotted rendering of the error path, e.g. `country.languages[0].name`.
    pub fn path_string(&self) -> String {
        format_path(&self.path)
    }
}

impl std::fmt::Display for GraphQLResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if !self.locations.is_empty() {
            write!(f, " at ")?;
            for (i, loc) in self.locations.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}:{}", loc.line, loc.column)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for GraphQLResponseError {}

/// Location in the GraphQL query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorLocation {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
}

/// Path segment in a GraphQL error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Field name.
    Field(String),
    /// Array index.
    Index(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{}", name),
            Self::Index(idx) => write!(f, "[{}]", idx),
        }
    }
}

/// Format a path as a string.
pub fn format_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Field(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            PathSegment::Index(_) => out.push_str(&segment.to_string()),
        }
    }
    out
}
