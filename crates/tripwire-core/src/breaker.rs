//! Circuit breaker
//!
//! A [`Breaker`] holds only its name, configuration and a store handle; all
//! mutable state lives in the store. `execute` runs at most two store updates
//! around the guarded operation:
//!
//! ```text
//! execute(op)
//!     → update(admit)            storage error ⇒ return it, op never runs
//!     → denied                   ⇒ CircuitOpen, op never runs
//!     → op()
//!     → update(record_success | record_failure)
//! ```
//!
//! The two updates are not atomic with the operation, so concurrent callers
//! can all be admitted while the circuit is half-open.

use crate::config::BreakerConfig;
use crate::error::{BreakerError, ConfigError, StoreError, StoreResult};
use crate::record::{Record, State};
use crate::storage::{MemoryStore, Store};
use crate::transition;
use chrono::Utc;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Circuit breaker over a shared [`Store`]
#[derive(Clone)]
pub struct Breaker {
    name: String,
    config: BreakerConfig,
    store: Arc<dyn Store>,
}

impl std::fmt::Debug for Breaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Breaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Breaker {
    /// Create a breaker with its own in-process store
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConfig` if the name is empty or the
    /// configuration fails [`BreakerConfig::validate`]
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Result<Self, ConfigError> {
        Self::with_store(name, config, Arc::new(MemoryStore::new()))
    }

    /// Create a breaker over a shared store
    ///
    /// Breakers with the same name on the same store share state.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConfig` if the name is empty or the
    /// configuration fails [`BreakerConfig::validate`]
    pub fn with_store(
        name: impl Into<String>,
        config: BreakerConfig,
        store: Arc<dyn Store>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::invalid("name", "breaker name cannot be empty"));
        }
        config.validate()?;

        Ok(Self {
            name,
            config,
            store,
        })
    }

    /// Create with default configuration and an in-process store
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConfig` if the name is empty
    pub fn with_defaults(name: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(name, BreakerConfig::default())
    }

    /// Breaker name (the store key)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Breaker configuration
    #[must_use]
    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Store holding this breaker's record
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Run `operation` through the breaker
    ///
    /// # Errors
    ///
    /// - `CircuitOpen` if admission is denied
    /// - `Storage` if a store update fails (admission or success recording)
    /// - `Operation` with the operation's own error once the failure is recorded
    /// - `Combined` if the operation fails and recording the failure fails too
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_context(&CancellationToken::new(), |_| operation())
            .await
    }

    /// Run `operation` through the breaker, honoring `ctx`
    ///
    /// Every store call races `ctx` and fails with `StoreError::Cancelled` once
    /// it fires. The token is handed to `operation`; the breaker puts no
    /// deadline of its own on it.
    ///
    /// # Errors
    ///
    /// Same as [`Breaker::execute`]
    pub async fn execute_with_context<F, Fut, T, E>(
        &self,
        ctx: &CancellationToken,
        operation: F,
    ) -> Result<T, BreakerError<E>>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_optional(ctx, Some(operation)).await
    }

    /// Run an operation that may be absent
    ///
    /// `None` fails with `NilFunction` without touching the store.
    ///
    /// # Errors
    ///
    /// `NilFunction`, otherwise same as [`Breaker::execute`]
    pub async fn execute_optional<F, Fut, T, E>(
        &self,
        ctx: &CancellationToken,
        operation: Option<F>,
    ) -> Result<T, BreakerError<E>>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(operation) = operation else {
            return Err(BreakerError::NilFunction);
        };

        let allowed = self.allow(ctx).await.map_err(BreakerError::Storage)?;
        if !allowed {
            debug!(breaker = %self.name, "Request rejected, circuit open");
            return Err(BreakerError::CircuitOpen {
                name: self.name.clone(),
            });
        }

        match operation(ctx.clone()).await {
            Ok(value) => {
                self.on_success(ctx).await.map_err(BreakerError::Storage)?;
                Ok(value)
            }
            Err(err) => match self.on_failure(ctx).await {
                Ok(()) => Err(BreakerError::Operation(err)),
                Err(storage) => {
                    warn!(
                        breaker = %self.name,
                        error = %storage,
                        "Failed to record operation failure"
                    );
                    Err(BreakerError::Combined {
                        operation: err,
                        storage,
                    })
                }
            },
        }
    }

    /// Current record, normalized; the default record if none is stored
    ///
    /// # Errors
    ///
    /// Returns the store's error for anything other than "not found"
    pub async fn snapshot(&self) -> StoreResult<Record> {
        self.snapshot_with_context(&CancellationToken::new()).await
    }

    /// [`Breaker::snapshot`] honoring `ctx`
    ///
    /// # Errors
    ///
    /// Returns the store's error for anything other than "not found"
    pub async fn snapshot_with_context(&self, ctx: &CancellationToken) -> StoreResult<Record> {
        match with_cancel(ctx, self.store.load(&self.name)).await {
            Ok(record) => Ok(record.normalized()),
            Err(StoreError::NotFound { .. }) => Ok(Record::default()),
            Err(e) => Err(e),
        }
    }

    /// Current state
    ///
    /// # Errors
    ///
    /// Same as [`Breaker::snapshot`]
    pub async fn state(&self) -> StoreResult<State> {
        Ok(self.snapshot().await?.state)
    }

    /// [`Breaker::state`] honoring `ctx`
    ///
    /// # Errors
    ///
    /// Same as [`Breaker::snapshot`]
    pub async fn state_with_context(&self, ctx: &CancellationToken) -> StoreResult<State> {
        Ok(self.snapshot_with_context(ctx).await?.state)
    }

    /// Overwrite the stored record with the default (closed) record
    ///
    /// # Errors
    ///
    /// Returns the store's error
    pub async fn reset(&self) -> StoreResult<()> {
        self.reset_with_context(&CancellationToken::new()).await
    }

    /// [`Breaker::reset`] honoring `ctx`
    ///
    /// # Errors
    ///
    /// Returns the store's error, or `Cancelled` if `ctx` fires first
    pub async fn reset_with_context(&self, ctx: &CancellationToken) -> StoreResult<()> {
        with_cancel(ctx, self.store.save(&self.name, &Record::default())).await?;
        info!(breaker = %self.name, "Circuit breaker reset");
        Ok(())
    }

    async fn allow(&self, ctx: &CancellationToken) -> StoreResult<bool> {
        let allowed = AtomicBool::new(false);
        self.transition(ctx, |record| {
            let admission = transition::admit(record, &self.config, Utc::now());
            allowed.store(admission.allowed, Ordering::SeqCst);
            admission.record
        })
        .await?;
        Ok(allowed.load(Ordering::SeqCst))
    }

    async fn on_success(&self, ctx: &CancellationToken) -> StoreResult<()> {
        self.transition(ctx, |record| {
            transition::record_success(record, &self.config)
        })
        .await
        .map(drop)
    }

    async fn on_failure(&self, ctx: &CancellationToken) -> StoreResult<()> {
        let now = Utc::now();
        self.transition(ctx, |record| {
            transition::record_failure(record, &self.config, now)
        })
        .await
        .map(drop)
    }

    /// Apply `step` through `Store::update` and log any state change.
    /// `step` may run several times; only the committed run counts.
    async fn transition<S>(&self, ctx: &CancellationToken, step: S) -> StoreResult<Record>
    where
        S: Fn(Record) -> Record + Send + Sync,
    {
        let previous = AtomicU8::new(u8::from(State::Closed));
        let committed = with_cancel(
            ctx,
            self.store.update(&self.name, &|record: Record| {
                previous.store(u8::from(record.state), Ordering::SeqCst);
                Ok(step(record))
            }),
        )
        .await?;

        self.log_transition(State::from(previous.load(Ordering::SeqCst)), &committed);
        Ok(committed)
    }

    fn log_transition(&self, from: State, to: &Record) {
        match (from, to.state) {
            (State::Closed, State::Open) => warn!(
                breaker = %self.name,
                failures = to.failures,
                threshold = self.config.failure_threshold,
                "Circuit breaker opened"
            ),
            (State::HalfOpen, State::Open) => warn!(
                breaker = %self.name,
                "Circuit breaker failure in half-open state, reopening"
            ),
            (State::Open, State::HalfOpen) => {
                info!(breaker = %self.name, "Circuit breaker entering half-open state")
            }
            (State::HalfOpen, State::Closed) => {
                info!(breaker = %self.name, "Circuit breaker closed")
            }
            (State::Unrecognized(value), _) => warn!(
                breaker = %self.name,
                value = value,
                "Discarded unrecognized circuit state"
            ),
            _ => {}
        }
    }
}

/// Race a store call against the caller's cancellation token
async fn with_cancel<T, Fut>(ctx: &CancellationToken, call: Fut) -> StoreResult<T>
where
    Fut: Future<Output = StoreResult<T>>,
{
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(StoreError::Cancelled),
        result = call => result,
    }
}
