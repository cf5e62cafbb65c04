//! Tripwire Core - Circuit Breaker Engine
//!
//! This crate provides the admission-control core of Tripwire:
//! - Record: persisted per-breaker state and counters
//! - Codec: record encoding for byte-oriented backends
//! - Storage: atomic read-modify-write over in-process or remote state
//! - Transition: pure state machine functions
//! - Breaker: runs guarded operations through the state machine
//!
//! The state machine is written once, as functions of (record, event), and
//! every backend supplies its own atomicity around them: an exclusive lock
//! for `MemoryStore`, optimistic transactions with bounded retry for
//! `DistributedStore`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod breaker;
pub mod codec;
pub mod config;
pub mod error;
pub mod record;
pub mod storage;
pub mod transition;

pub use breaker::Breaker;
pub use codec::{Codec, JsonCodec};
pub use config::BreakerConfig;
pub use error::{BreakerError, ConfigError, StoreError, StoreResult};
pub use record::{Record, State};
pub use storage::{
    DistributedStore, KvClient, MemoryStore, RedisKv, Store, UpdateFn, WatchFn,
    DEFAULT_MAX_RETRIES,
};
pub use tokio_util::sync::CancellationToken;
