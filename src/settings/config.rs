//! Configuration types

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tripwire_core::{Breaker, BreakerConfig, DistributedStore, MemoryStore, RedisKv, Store};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub breaker: BreakerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

impl AppConfig {
    /// Build the breaker `name` over the configured store
    pub fn breaker(&self, name: &str) -> Result<Breaker> {
        let store = self.storage.open_store()?;
        Breaker::with_store(name, self.breaker.to_config(), store)
            .with_context(|| format!("Failed to create breaker '{}'", name))
    }
}

/// Breaker thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerSettings {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,
    /// Open-state timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_success_threshold() -> u32 {
    2
}

fn default_timeout_ms() -> u64 {
    60_000
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            success_threshold: default_success_threshold(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl BreakerSettings {
    pub fn to_config(&self) -> BreakerConfig {
        BreakerConfig::new()
            .with_failure_threshold(self.failure_threshold)
            .with_success_threshold(self.success_threshold)
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }
}

/// Where breaker records live
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// This process only
    #[default]
    Memory,
    /// Shared through Redis
    Redis,
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Record expiry in seconds, 0 = never
    #[serde(default)]
    pub ttl_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_key_prefix() -> String {
    "tripwire".to_string()
}

fn default_max_retries() -> u32 {
    tripwire_core::DEFAULT_MAX_RETRIES
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            redis_url: default_redis_url(),
            key_prefix: default_key_prefix(),
            ttl_secs: 0,
            max_retries: default_max_retries(),
        }
    }
}

impl StorageSettings {
    /// Record expiry, if any
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }

    /// Open the configured store
    pub fn open_store(&self) -> Result<Arc<dyn Store>> {
        match self.backend {
            StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
            StorageBackend::Redis => {
                let client = RedisKv::new(&self.redis_url)
                    .with_context(|| format!("Invalid Redis URL: {}", self.redis_url))?;
                let mut store = DistributedStore::new(client)
                    .with_key_prefix(self.key_prefix.clone())
                    .with_max_retries(self.max_retries);
                if let Some(ttl) = self.ttl() {
                    store = store.with_ttl(ttl);
                }
                Ok(Arc::new(store))
            }
        }
    }
}

#[cfg(test)]
mod tests;
