//! Breaker registry
//!
//! A name → breaker table used to hand the same breaker to several call
//! sites. It is an ordinary value: clones share one table, and separately
//! constructed registries are fully independent.

use crate::error::RegistryError;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;
use tripwire_core::Breaker;

/// Shared name → [`Breaker`] lookup
#[derive(Debug, Clone, Default)]
pub struct BreakerRegistry {
    breakers: Arc<DashMap<String, Arc<Breaker>>>,
}

impl BreakerRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a breaker under its own name, replacing any previous entry
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::EmptyName` if the breaker name is empty
    pub fn register(&self, breaker: Arc<Breaker>) -> Result<(), RegistryError> {
        let name = breaker.name().to_string();
        self.register_as(name, breaker)
    }

    /// Register a breaker under an explicit name
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::EmptyName` if `name` is empty
    pub fn register_as(
        &self,
        name: impl Into<String>,
        breaker: Arc<Breaker>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        debug!(name = %name, breaker = %breaker.name(), "Breaker registered");
        self.breakers.insert(name, breaker);
        Ok(())
    }

    /// Look up a breaker
    ///
    /// # Errors
    ///
    /// `EmptyName` for an empty name, `NotFound` if nothing is registered
    pub fn get(&self, name: &str) -> Result<Arc<Breaker>, RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        self.breakers
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }

    /// Remove a breaker, returning it if it was registered
    pub fn remove(&self, name: &str) -> Option<Arc<Breaker>> {
        self.breakers.remove(name).map(|(_, breaker)| breaker)
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .breakers
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Number of registered breakers
    #[must_use]
    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
