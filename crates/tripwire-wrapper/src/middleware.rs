//! Circuit breaker middleware for Axum
//!
//! Wraps a [`Breaker`] as a tower layer. Each request is one guarded call:
//! responses at or above the failure status are recorded as failures but still
//! reach the client unchanged, an open circuit short-circuits with 503, and
//! breaker storage errors become 500.

use crate::error::RegistryError;
use crate::registry::BreakerRegistry;
use axum::{
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{error, warn};
use tripwire_core::{Breaker, BreakerError};

// ============================================================================
// Error Response
// ============================================================================

#[derive(Debug, Serialize)]
struct BreakerErrorResponse {
    success: bool,
    error: String,
    code: String,
}

fn error_response(status: StatusCode, message: String, code: &str) -> Response {
    let body = BreakerErrorResponse {
        success: false,
        error: message,
        code: code.to_string(),
    };
    (status, Json(body)).into_response()
}

// ============================================================================
// Guarded outcome
// ============================================================================

/// Why a request counted as a breaker failure
enum Failure<E> {
    /// Handler answered with a failure status; the response is still delivered
    Status(Response),
    /// Inner service errored
    Inner(E),
}

// ============================================================================
// Axum Layer
// ============================================================================

/// Default threshold: any 5xx counts as a failure
pub const DEFAULT_FAILURE_STATUS: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;

/// Circuit breaker layer for Axum
#[derive(Clone)]
pub struct CircuitBreakerLayer {
    breaker: Arc<Breaker>,
    failure_status: StatusCode,
}

impl CircuitBreakerLayer {
    /// Guard requests with `breaker`
    pub fn new(breaker: Arc<Breaker>) -> Self {
        Self {
            breaker,
            failure_status: DEFAULT_FAILURE_STATUS,
        }
    }

    /// Guard requests with the breaker registered as `name`
    ///
    /// # Errors
    ///
    /// Returns the registry lookup error
    pub fn from_registry(registry: &BreakerRegistry, name: &str) -> Result<Self, RegistryError> {
        Ok(Self::new(registry.get(name)?))
    }

    /// Responses with a status at or above `status` count as failures
    #[must_use]
    pub fn with_failure_status(mut self, status: StatusCode) -> Self {
        self.failure_status = status;
        self
    }

    /// The guarding breaker
    pub fn breaker(&self) -> &Arc<Breaker> {
        &self.breaker
    }
}

impl<S> Layer<S> for CircuitBreakerLayer {
    type Service = CircuitBreakerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CircuitBreakerService {
            inner,
            breaker: self.breaker.clone(),
            failure_status: self.failure_status,
        }
    }
}

// ============================================================================
// Axum Service
// ============================================================================

/// Circuit breaker service wrapper
#[derive(Clone)]
pub struct CircuitBreakerService<S> {
    inner: S,
    breaker: Arc<Breaker>,
    failure_status: StatusCode,
}

type BoxFuture<T, E> =
    std::pin::Pin<Box<dyn std::future::Future<Output = std::result::Result<T, E>> + Send>>;

impl<S, B> Service<Request<B>> for CircuitBreakerService<S>
where
    S: Service<Request<B>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<Response, S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> BoxFuture<Response, S::Error> {
        let breaker = self.breaker.clone();
        let failure_status = self.failure_status;
        // The readied service handles this request; keep a fresh clone for the next
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let outcome = breaker
                .execute(|| async move {
                    match inner.call(req).await {
                        Ok(response) if response.status() >= failure_status => {
                            Err(Failure::Status(response))
                        }
                        Ok(response) => Ok(response),
                        Err(err) => Err(Failure::Inner(err)),
                    }
                })
                .await;

            match outcome {
                Ok(response) => Ok(response),
                Err(BreakerError::Operation(failure)) => settle(failure),
                Err(BreakerError::Combined { operation, storage }) => {
                    warn!(
                        breaker = %breaker.name(),
                        error = %storage,
                        "Request failure was not recorded"
                    );
                    settle(operation)
                }
                Err(BreakerError::CircuitOpen { name }) => {
                    warn!(breaker = %name, "Request rejected, circuit open");
                    Ok(error_response(
                        StatusCode::SERVICE_UNAVAILABLE,
                        format!("Service unavailable: circuit breaker '{}' is open", name),
                        "CIRCUIT_OPEN",
                    ))
                }
                Err(BreakerError::Storage(storage)) => {
                    error!(breaker = %breaker.name(), error = %storage, "Circuit breaker storage error");
                    Ok(error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("circuit breaker storage error: {}", storage),
                        "CIRCUIT_BREAKER_ERROR",
                    ))
                }
                Err(BreakerError::NilFunction) => Ok(error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "guarded function cannot be absent".to_string(),
                    "CIRCUIT_BREAKER_ERROR",
                )),
            }
        })
    }
}

fn settle<E>(failure: Failure<E>) -> std::result::Result<Response, E> {
    match failure {
        Failure::Status(response) => Ok(response),
        Failure::Inner(err) => Err(err),
    }
}
