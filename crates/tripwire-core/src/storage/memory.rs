//! In-process store

use super::{Store, UpdateFn};
use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory store backed by a `HashMap<name, Record>`
///
/// Records live only as long as the store. Share one instance (behind an
/// `Arc`) between breakers that should see the same state.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, Record>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether no record has been written yet
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load(&self, name: &str) -> StoreResult<Record> {
        let records = self.records.read().await;
        records.get(name).cloned().ok_or_else(|| StoreError::NotFound {
            name: name.to_string(),
        })
    }

    async fn save(&self, name: &str, record: &Record) -> StoreResult<()> {
        let mut records = self.records.write().await;
        records.insert(name.to_string(), record.clone());
        Ok(())
    }

    async fn update(&self, name: &str, transform: &UpdateFn<'_>) -> StoreResult<Record> {
        // Held across the transform; transforms are pure and never await.
        let mut records = self.records.write().await;

        let current = records.get(name).cloned().unwrap_or_default();
        let updated = transform(current)?;
        records.insert(name.to_string(), updated.clone());

        debug!(breaker = %name, state = %updated.state, "Record updated in memory");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests;
