//! Bearer token supply.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;

use crate::BoxError;

/// Supplies bearer tokens on demand.
///
/// Called whenever the client has no cached token: before the first request
/// and after the server rejected the previous token with `401`.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Produce a fresh token. An empty string means "no token".
    async fn token(&self) -> Result<String, BoxError>;
}

/// A fixed token.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Create a provider that always returns `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String, BoxError> {
        Ok(self.0.clone())
    }
}

/// Provider backed by an async closure. See [`token_fn`].
pub struct TokenFn<F>(F);

/// Wrap an async closure as a [`TokenProvider`].
///
/// ```rust,ignore
/// let provider = token_fn(|| async { Ok(std::env::var("API_TOKEN")?) });
/// ```
pub fn token_fn<F, Fut>(f: F) -> TokenFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, BoxError>> + Send,
{
    TokenFn(f)
}

#[async_trait]
impl<F, Fut> TokenProvider for TokenFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, BoxError>> + Send,
{
    async fn token(&self) -> Result<String, BoxError> {
        (self.0)().await
    }
}

/// The client's cached bearer token.
#[derive(Default)]
pub(crate) struct TokenCache {
    token: Mutex<Option<String>>,
    // Held across the provider call so concurrent callers share one refresh.
    refresh: tokio::sync::Mutex<()>,
}

impl TokenCache {
    pub(crate) fn current(&self) -> Option<String> {
        self.token.lock().clone()
    }

    pub(crate) fn set(&self, token: impl Into<String>) {
        let token = token.into();
        *self.token.lock() = (!token.is_empty()).then_some(token);
    }

    pub(crate) fn clear(&self) {
        *self.token.lock() = None;
    }

    /// Drop the cached token if it is still the one that was rejected.
    ///
    /// A concurrent call may already have replaced it with a fresh token,
    /// which must survive.
    pub(crate) fn invalidate(&self, rejected: &str) -> bool {
        let mut token = self.token.lock();
        if token.as_deref() == Some(rejected) {
            *token = None;
            true
        } else {
            false
        }
    }

    /// Return the cached token, asking `provider` for one if none is cached.
    pub(crate) async fn get_or_refresh(
        &self,
        provider: Option<&dyn TokenProvider>,
    ) -> Result<Option<String>, BoxError> {
        if let Some(token) = self.current() {
            return Ok(Some(token));
        }
        let Some(provider) = provider else {
            return Ok(None);
        };

        let _refresh = self.refresh.lock().await;
        if let Some(token) = self.current() {
            return Ok(Some(token));
        }

        let token = provider.token().await?;
        self.set(token);
        Ok(self.current())
    }
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("cached", &self.token.lock().is_some())
            .finish()
    }
}
