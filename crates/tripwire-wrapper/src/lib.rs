//! Tripwire Wrapper - Circuit Breaker Integrations
//!
//! Adapters that put a [`tripwire_core::Breaker`] in front of real traffic:
//! - Registry: named breakers shared between call sites
//! - HTTP: a `reqwest` client that fails fast while a circuit is open
//! - Middleware: an Axum layer guarding inbound requests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod middleware;
pub mod registry;

pub use error::{HttpError, RegistryError};
pub use http::{HttpResult, HttpWrapper};
pub use middleware::{CircuitBreakerLayer, CircuitBreakerService, DEFAULT_FAILURE_STATUS};
pub use registry::BreakerRegistry;
