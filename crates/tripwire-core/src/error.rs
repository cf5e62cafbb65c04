//! Error types for tripwire-core
//!
//! - `StoreError`: persistence failures, including the NotFound / Conflict
//!   signals that the breaker and distributed store consume internally
//! - `ConfigError`: invalid breaker configuration, raised at construction
//! - `BreakerError`: everything `Breaker::execute` can return

use thiserror::Error;

/// Errors produced by a [`Store`](crate::storage::Store) or [`Codec`](crate::codec::Codec)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record has been persisted under this name
    #[error("storage record not found: {name}")]
    NotFound {
        /// Breaker name (or key) that was looked up
        name: String,
    },

    /// A concurrent writer modified the record before commit
    #[error("storage record update conflict on '{key}' after {attempts} attempt(s)")]
    Conflict {
        /// Backend key that was contended
        key: String,
        /// Number of transaction attempts made
        attempts: u32,
    },

    /// Record could not be encoded
    #[error("failed to encode record: {0}")]
    Encode(String),

    /// Stored bytes could not be decoded
    #[error("failed to decode record: {0}")]
    Decode(String),

    /// I/O or remote service failure
    #[error("storage backend error: {0}")]
    Backend(String),

    /// The caller's cancellation token fired before the operation finished
    #[error("storage operation cancelled")]
    Cancelled,
}

impl StoreError {
    /// Whether this is the "no record persisted" signal
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this is an optimistic-concurrency conflict
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Result type for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Invalid breaker configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A configuration value is out of range
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Error returned by [`Breaker::execute`](crate::Breaker::execute)
///
/// `E` is the guarded operation's own error type. When the operation fails and
/// recording that failure also fails, [`BreakerError::Combined`] keeps both.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// No guarded operation was supplied
    #[error("guarded function cannot be absent")]
    NilFunction,

    /// Admission denied; the guarded operation did not run
    #[error("circuit breaker '{name}' is open")]
    CircuitOpen {
        /// Breaker name
        name: String,
    },

    /// Reading or writing the breaker record failed
    #[error("circuit breaker storage error: {0}")]
    Storage(#[source] StoreError),

    /// The guarded operation failed and the failure was recorded
    #[error("{0}")]
    Operation(E),

    /// The guarded operation failed and recording the failure failed too
    #[error("{operation} (recording failure also failed: {storage})")]
    Combined {
        /// Error returned by the guarded operation
        operation: E,
        /// Error returned by the outcome update
        #[source]
        storage: StoreError,
    },
}

impl<E> BreakerError<E> {
    /// Whether admission was denied
    #[must_use]
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }

    /// The guarded operation's error, if it ran and failed
    #[must_use]
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            Self::Operation(err) | Self::Combined { operation: err, .. } => Some(err),
            _ => None,
        }
    }

    /// The storage error, if a store call failed
    #[must_use]
    pub fn storage_error(&self) -> Option<&StoreError> {
        match self {
            Self::Storage(err) | Self::Combined { storage: err, .. } => Some(err),
            _ => None,
        }
    }

    /// Take the guarded operation's error, discarding everything else
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            Self::Operation(err) | Self::Combined { operation: err, .. } => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests;
