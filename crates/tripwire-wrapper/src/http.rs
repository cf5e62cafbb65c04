//! Circuit-breaking HTTP client
//!
//! Every request goes through the breaker. Transport errors (connect, timeout,
//! body) count as failures; any HTTP status, including 5xx, is a success at
//! this level and left to the caller to interpret. A request still in flight
//! when the caller's token fires is abandoned with `HttpError::Cancelled`.

use crate::error::{HttpError, RegistryError};
use crate::registry::BreakerRegistry;
use reqwest::{Client, Method, Request, Response, Url};
use std::sync::Arc;
use tracing::debug;
use tripwire_core::{Breaker, BreakerError, CancellationToken};

/// Result of a guarded HTTP call
pub type HttpResult = Result<Response, BreakerError<HttpError>>;

/// HTTP client guarded by a circuit breaker
#[derive(Debug, Clone)]
pub struct HttpWrapper {
    client: Client,
    breaker: Arc<Breaker>,
}

impl HttpWrapper {
    /// Wrap `client` with `breaker`
    pub fn new(client: Client, breaker: Arc<Breaker>) -> Self {
        Self { client, breaker }
    }

    /// Wrap `client` with the breaker registered as `name`
    ///
    /// # Errors
    ///
    /// Returns the registry lookup error
    pub fn from_registry(
        client: Client,
        registry: &BreakerRegistry,
        name: &str,
    ) -> Result<Self, RegistryError> {
        Ok(Self::new(client, registry.get(name)?))
    }

    /// The guarding breaker
    pub fn breaker(&self) -> &Arc<Breaker> {
        &self.breaker
    }

    /// The underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send a prepared request through the breaker
    ///
    /// # Errors
    ///
    /// `CircuitOpen` without sending anything, `Operation` for transport
    /// errors, and breaker storage errors as `Storage`/`Combined`. A
    /// cancelled request cannot record its failure, so it surfaces as
    /// `Combined` with `HttpError::Cancelled` and `StoreError::Cancelled`.
    pub async fn execute(&self, request: Request) -> HttpResult {
        self.execute_with_context(&CancellationToken::new(), request)
            .await
    }

    /// Send a prepared request, aborting it and breaker store calls when `ctx` fires
    ///
    /// # Errors
    ///
    /// Same as [`HttpWrapper::execute`]
    pub async fn execute_with_context(
        &self,
        ctx: &CancellationToken,
        request: Request,
    ) -> HttpResult {
        debug!(
            breaker = %self.breaker.name(),
            method = %request.method(),
            url = %request.url(),
            "Guarded HTTP request"
        );

        self.breaker
            .execute_with_context(ctx, |token| async move {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(HttpError::Cancelled),
                    result = self.client.execute(request) => result.map_err(HttpError::Transport),
                }
            })
            .await
    }

    /// GET `url` through the breaker
    ///
    /// # Errors
    ///
    /// Same as [`HttpWrapper::execute`]
    pub async fn get(&self, url: Url) -> HttpResult {
        self.execute(Request::new(Method::GET, url)).await
    }
}
