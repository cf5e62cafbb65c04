//! Storage backends for breaker records
//!
//! Every backend implements [`Store`]. The breaker only mutates state through
//! [`Store::update`], which each backend makes atomic in its own way:
//! - `MemoryStore`: one exclusive lock held for read-transform-write
//! - `DistributedStore`: optimistic transactions with bounded conflict retry
//!
//! `RedisKv` is the production key-value client for `DistributedStore`.

mod distributed;
mod memory;
mod redis_kv;

pub use distributed::{DistributedStore, KvClient, WatchFn, DEFAULT_MAX_RETRIES};
pub use memory::MemoryStore;
pub use redis_kv::RedisKv;

use crate::error::StoreResult;
use crate::record::Record;
use async_trait::async_trait;

/// Pure transform applied by [`Store::update`]
///
/// Must only compute the next record: distributed backends may call it more
/// than once per update and discard all but the committed result.
pub type UpdateFn<'a> = dyn Fn(Record) -> StoreResult<Record> + Send + Sync + 'a;

/// Persistence for breaker records, keyed by breaker name
#[async_trait]
pub trait Store: Send + Sync {
    /// Load a record. Returns `StoreError::NotFound` if none was ever written.
    async fn load(&self, name: &str) -> StoreResult<Record>;

    /// Unconditionally overwrite a record
    async fn save(&self, name: &str, record: &Record) -> StoreResult<()>;

    /// Atomically read, transform and write a record
    ///
    /// The transform sees one consistent snapshot (the default record if none
    /// exists). If it returns `Ok`, that value is committed and returned; if it
    /// returns `Err`, nothing is written and the error is returned unchanged.
    async fn update(&self, name: &str, transform: &UpdateFn<'_>) -> StoreResult<Record>;
}
