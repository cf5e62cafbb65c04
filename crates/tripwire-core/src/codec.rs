//! Record encoding for byte-oriented backends
//!
//! The default [`JsonCodec`] writes a self-describing JSON object:
//!
//! ```text
//! {"state":1,"failures":5,"successes":0,"last_failure_time":"2026-01-04T10:00:00Z"}
//! ```
//!
//! Zero-length input decodes to `StoreError::NotFound` so a backend that
//! represents a missing key as empty bytes falls back to the default record.

use crate::error::{StoreError, StoreResult};
use crate::record::Record;

/// Translates a [`Record`] to and from bytes
pub trait Codec: Send + Sync {
    /// Encode a record
    fn encode(&self, record: &Record) -> StoreResult<Vec<u8>>;

    /// Decode a record. Empty input yields `StoreError::NotFound`.
    fn decode(&self, data: &[u8]) -> StoreResult<Record>;
}

/// JSON codec (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, record: &Record) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(record).map_err(|e| StoreError::Encode(e.to_string()))
    }

    fn decode(&self, data: &[u8]) -> StoreResult<Record> {
        if data.is_empty() {
            return Err(StoreError::NotFound {
                name: String::new(),
            });
        }
        serde_json::from_slice(data).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests;
