//! Store backed by a remote key-value service
//!
//! Atomicity comes from the service's optimistic transactions rather than a
//! lock: each update watches the key, reads it, writes the transformed value,
//! and retries from a fresh read if another writer got there first.
//!
//! # Update loop
//! ```text
//! attempt 1..=max_retries+1:
//!     watch(key) → read bytes (absent ⇒ default record) → decode
//!         → transform → encode → write
//!     committed  ⇒ return record
//!     Conflict   ⇒ next attempt
//!     other error ⇒ return it
//! exhausted      ⇒ Conflict
//! ```

use super::{Store, UpdateFn};
use crate::codec::{Codec, JsonCodec};
use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of conflict retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Transaction body run by [`KvClient::watch`]
///
/// Receives the watched key's current bytes (`None` if absent) and returns the
/// bytes to write in the same transaction.
pub type WatchFn<'a> = dyn FnMut(Option<&[u8]>) -> StoreResult<Vec<u8>> + Send + 'a;

/// Remote key-value service with optimistic transactions
#[async_trait]
pub trait KvClient: Send + Sync {
    /// Read a key. `Ok(None)` if it does not exist.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Write a key. `ttl` of `None` means no expiry.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StoreResult<()>;

    /// Run `apply` inside a transaction watching `key`
    ///
    /// Must return `StoreError::Conflict` if `key` was modified by another
    /// writer between the read and the commit. Errors returned by `apply`
    /// abort the transaction and are passed through unchanged.
    async fn watch(
        &self,
        key: &str,
        ttl: Option<Duration>,
        apply: &mut WatchFn<'_>,
    ) -> StoreResult<()>;
}

/// [`Store`] over a [`KvClient`]
pub struct DistributedStore<C> {
    client: C,
    key_prefix: String,
    ttl: Option<Duration>,
    codec: Arc<dyn Codec>,
    max_retries: u32,
}

impl<C: KvClient> DistributedStore<C> {
    /// Create a store with no key prefix, no TTL, JSON encoding and
    /// [`DEFAULT_MAX_RETRIES`]
    pub fn new(client: C) -> Self {
        Self {
            client,
            key_prefix: String::new(),
            ttl: None,
            codec: Arc::new(JsonCodec),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Prefix keys as `prefix:name`
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Expire records after `ttl`
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Use a custom codec
    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Set how many times a conflicting update is retried
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Maximum conflict retries
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Configured TTL
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Underlying client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Backend key for a breaker name
    #[must_use]
    pub fn key(&self, name: &str) -> String {
        if self.key_prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}:{}", self.key_prefix, name)
        }
    }

    fn decode_or_default(&self, bytes: Option<&[u8]>) -> StoreResult<Record> {
        match bytes {
            None => Ok(Record::default()),
            Some(data) => match self.codec.decode(data) {
                Err(StoreError::NotFound { .. }) => Ok(Record::default()),
                other => other,
            },
        }
    }
}

#[async_trait]
impl<C: KvClient> Store for DistributedStore<C> {
    async fn load(&self, name: &str) -> StoreResult<Record> {
        let key = self.key(name);
        match self.client.get(&key).await? {
            Some(data) => self.codec.decode(&data).map_err(|e| match e {
                StoreError::NotFound { .. } => StoreError::NotFound {
                    name: name.to_string(),
                },
                other => other,
            }),
            None => Err(StoreError::NotFound {
                name: name.to_string(),
            }),
        }
    }

    async fn save(&self, name: &str, record: &Record) -> StoreResult<()> {
        let payload = self.codec.encode(record)?;
        self.client.set(&self.key(name), payload, self.ttl).await
    }

    async fn update(&self, name: &str, transform: &UpdateFn<'_>) -> StoreResult<Record> {
        let key = self.key(name);
        let attempts = self.max_retries.saturating_add(1);

        for attempt in 1..=attempts {
            let mut committed = None;
            let mut apply = |current: Option<&[u8]>| -> StoreResult<Vec<u8>> {
                let record = self.decode_or_default(current)?;
                let updated = transform(record)?;
                let payload = self.codec.encode(&updated)?;
                committed = Some(updated);
                Ok(payload)
            };

            let outcome = self.client.watch(&key, self.ttl, &mut apply).await;
            match outcome {
                Ok(()) => {
                    if attempt > 1 {
                        debug!(key = %key, attempt = attempt, "Update committed after retry");
                    }
                    return committed.ok_or_else(|| {
                        StoreError::Backend(format!(
                            "transaction on '{key}' committed without running its body"
                        ))
                    });
                }
                Err(StoreError::Conflict { .. }) => {
                    debug!(
                        key = %key,
                        attempt = attempt,
                        max_retries = self.max_retries,
                        "Update conflicted, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            key = %key,
            attempts = attempts,
            "Update abandoned after repeated conflicts"
        );
        Err(StoreError::Conflict { key, attempts })
    }
}
