//! Error types for tripwire-wrapper

use thiserror::Error;

/// Registry lookup and registration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Breaker names must be non-empty
    #[error("breaker name cannot be empty")]
    EmptyName,

    /// No breaker registered under this name
    #[error("breaker not found in registry: {name}")]
    NotFound {
        /// Requested name
        name: String,
    },
}

/// Failure of a guarded HTTP request
#[derive(Debug, Error)]
pub enum HttpError {
    /// Connect, timeout or body error from the client
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The caller's token fired while the request was in flight
    #[error("HTTP request cancelled")]
    Cancelled,
}

impl HttpError {
    /// Whether the request was abandoned by cancellation
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The underlying client error, if any
    #[must_use]
    pub fn transport(&self) -> Option<&reqwest::Error> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Cancelled => None,
        }
    }
}
