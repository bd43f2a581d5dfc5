//! HTTP transport abstraction.
//!
//! The client never talks to the network directly: it hands a fully built
//! [`http::Request`] to a [`Transport`] and gets back status, headers and the
//! buffered body. [`ReqwestTransport`] is the default; tests and embedders can
//! plug in anything else (a tower service, a recorded fixture, an in-process
//! server).

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::TransportError;

/// Executes a single HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the complete response.
    ///
    /// Only failures to complete the exchange are errors. Any HTTP status,
    /// including 4xx and 5xx, is a successful return.
    async fn execute(
        &self,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<Bytes>, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(
        &self,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<Bytes>, TransportError> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn execute(
        &self,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<Bytes>, TransportError> {
        (**self).execute(request).await
    }
}

/// Transport backed by a [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Wrap an existing reqwest client (shares its connection pool).
    pub fn new(client: reqwest::Client) -> Self {
        Self { inner: client }
    }

    /// Build a client with the given user agent.
    ///
    /// No client-wide timeout is set: the GraphQL client bounds every attempt
    /// itself, so a per-call timeout may exceed the configured default.
    pub fn with_user_agent(user_agent: &str) -> Result<Self, TransportError> {
        let inner = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .build()?;
        Ok(Self { inner })
    }

    /// Get the underlying reqwest client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(
        &self,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<Bytes>, TransportError> {
        let (parts, body) = request.into_parts();

        // reqwest needs an absolute URL; relative endpoints are only usable with custom transports.
        let url = url::Url::parse(&parts.uri.to_string())
            .map_err(|e| TransportError::InvalidRequest(format!("{}: {}", parts.uri, e)))?;

        let mut outgoing = reqwest::Request::new(parts.method, url);
        *outgoing.headers_mut() = parts.headers;
        *outgoing.body_mut() = Some(reqwest::Body::from(body));

        let response = self.inner.execute(outgoing).await.map_err(|e| {
            if e.is_connect() {
                TransportError::Connection(e.to_string())
            } else {
                TransportError::Http(e)
            }
        })?;

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        let mut converted = http::Response::new(body);
        *converted.status_mut() = status;
        *converted.version_mut() = version;
        *converted.headers_mut() = headers;
        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_relative_uri_is_rejected() {
        let transport = ReqwestTransport::new(reqwest::Client::new());
        let request = http::Request::post("/query").body(Bytes::new()).unwrap();

        let err = transport.execute(request).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
        assert!(err.to_string().contains("/query"));
    }

    #[test]
    fn test_with_user_agent() {
        let transport = ReqwestTransport::with_user_agent("gqlclient-test").unwrap();
        let _ = transport.inner();
    }
}
