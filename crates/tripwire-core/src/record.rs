//! Persisted breaker state
//!
//! A [`Record`] is the whole state of one named breaker. Absence of a record
//! in a store means the default (Closed, zero counters, no failure time).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Circuit breaker state
///
/// Persisted as a small integer (0 = Closed, 1 = Open, 2 = HalfOpen). Any other
/// integer read back from storage is kept as [`State::Unrecognized`] so the
/// breaker can discard it instead of acting on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum State {
    /// Normal operation - requests pass through
    Closed,
    /// Failures exceeded threshold - requests are rejected
    Open,
    /// Testing recovery - trial requests pass through
    HalfOpen,
    /// Out-of-range value read from storage
    Unrecognized(u8),
}

impl State {
    /// Whether this is one of the three valid states
    #[must_use]
    pub fn is_valid(self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl Default for State {
    fn default() -> Self {
        Self::Closed
    }
}

impl From<u8> for State {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Closed,
            1 => Self::Open,
            2 => Self::HalfOpen,
            other => Self::Unrecognized(other),
        }
    }
}

impl From<State> for u8 {
    fn from(state: State) -> Self {
        match state {
            State::Closed => 0,
            State::Open => 1,
            State::HalfOpen => 2,
            State::Unrecognized(other) => other,
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
            Self::Unrecognized(value) => write!(f, "Unrecognized({value})"),
        }
    }
}

/// Snapshot of one breaker's state and counters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    /// Current admission state
    pub state: State,
    /// Consecutive failures counted while Closed
    pub failures: u64,
    /// Consecutive successes counted while HalfOpen
    pub successes: u64,
    /// Time of the most recent recorded failure
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_failure_time"
    )]
    pub last_failure_time: Option<DateTime<Utc>>,
}

impl Record {
    /// The record every breaker starts from
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace an unrecognized state with the default record
    #[must_use]
    pub fn normalized(self) -> Self {
        if self.state.is_valid() {
            self
        } else {
            Self::default()
        }
    }
}

// Older writers persisted "no failure yet" as the year-1 zero timestamp.
fn deserialize_failure_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<DateTime<Utc>>::deserialize(deserializer)?;
    Ok(value.filter(|ts| ts.timestamp() != ZERO_TIMESTAMP_SECS))
}

/// Seconds from the Unix epoch to 0001-01-01T00:00:00Z
const ZERO_TIMESTAMP_SECS: i64 = -62_135_596_800;
