//! Breaker transition functions
//!
//! Each function maps (current record, event) to the next record and touches
//! nothing else, so the same logic runs under a lock or inside an optimistic
//! transaction that may be replayed.
//!
//! # State Transitions
//! ```text
//! Closed   → Open:     failures >= failure_threshold
//! Open     → HalfOpen: admission check after timeout elapsed
//! HalfOpen → Closed:   successes >= success_threshold
//! HalfOpen → Open:     any failure
//! ```

use crate::config::BreakerConfig;
use crate::record::{Record, State};
use chrono::{DateTime, Utc};

/// Outcome of an admission check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// Record to commit
    pub record: Record,
    /// Whether the guarded operation may run
    pub allowed: bool,
}

/// Decide whether a request may run
///
/// An unrecognized state is reset to the default record and the request that
/// observed it is denied.
#[must_use]
pub fn admit(mut record: Record, config: &BreakerConfig, now: DateTime<Utc>) -> Admission {
    let allowed = match record.state {
        State::Closed | State::HalfOpen => true,
        State::Open => {
            if open_timeout_elapsed(&record, config, now) {
                record.state = State::HalfOpen;
                record.successes = 0;
                true
            } else {
                false
            }
        }
        State::Unrecognized(_) => {
            record = Record::default();
            false
        }
    };
    Admission { record, allowed }
}

/// Record a successful call
#[must_use]
pub fn record_success(record: Record, config: &BreakerConfig) -> Record {
    let mut record = record.normalized();
    match record.state {
        State::Closed => {
            record.failures = 0;
            record.successes = 0;
        }
        State::HalfOpen => {
            record.successes += 1;
            if record.successes >= u64::from(config.success_threshold) {
                record.state = State::Closed;
                record.failures = 0;
                record.successes = 0;
            }
        }
        // Unreachable through admission, left as-is
        State::Open | State::Unrecognized(_) => {}
    }
    record
}

/// Record a failed call
#[must_use]
pub fn record_failure(record: Record, config: &BreakerConfig, now: DateTime<Utc>) -> Record {
    let mut record = record.normalized();
    record.last_failure_time = Some(now);

    match record.state {
        State::Closed => {
            record.failures += 1;
            record.successes = 0;
            if record.failures >= u64::from(config.failure_threshold) {
                record.state = State::Open;
            }
        }
        State::HalfOpen => {
            record.state = State::Open;
            record.successes = 0;
        }
        State::Open | State::Unrecognized(_) => {}
    }
    record
}

/// Strictly more than `timeout` since the last failure. A missing failure
/// time counts as expired; a failure time in the future does not.
fn open_timeout_elapsed(record: &Record, config: &BreakerConfig, now: DateTime<Utc>) -> bool {
    match record.last_failure_time {
        None => true,
        Some(last) => (now - last)
            .to_std()
            .map(|elapsed| elapsed > config.timeout)
            .unwrap_or(false),
    }
}
