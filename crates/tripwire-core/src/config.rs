//! Breaker configuration

use crate::error::ConfigError;
use std::time::Duration;

/// Configuration for a [`Breaker`](crate::Breaker)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive failures (while Closed) that open the circuit
    pub failure_threshold: u32,
    /// Successes in half-open state that close the circuit
    pub success_threshold: u32,
    /// Time the circuit stays open before admitting trial requests
    pub timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(60),
        }
    }
}

impl BreakerConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set failure threshold
    #[must_use]
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set success threshold for half-open state
    #[must_use]
    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }

    /// Set open-state timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject zero thresholds and a zero timeout
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConfig` naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::invalid(
                "failure_threshold",
                "supplied threshold must be greater than zero",
            ));
        }
        if self.success_threshold == 0 {
            return Err(ConfigError::invalid(
                "success_threshold",
                "supplied threshold must be greater than zero",
            ));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::invalid(
                "timeout",
                "supplied duration must be greater than zero",
            ));
        }
        Ok(())
    }
}
