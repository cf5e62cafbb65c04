//! Contract tests for the `Store` trait.
//!
//! Every backend must satisfy the same atomic-update contract. The distributed
//! store is exercised against `VersionedKv`, an in-test key-value service that
//! implements real optimistic concurrency (version check at commit).

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tripwire_core::{
    Breaker, BreakerConfig, DistributedStore, KvClient, MemoryStore, Record, State, Store,
    StoreError, StoreResult, WatchFn,
};

#[derive(Default)]
struct VersionedKv {
    entries: Mutex<HashMap<String, (u64, Vec<u8>)>>,
    conflicts: AtomicU32,
}

impl VersionedKv {
    fn version(&self, key: &str) -> u64 {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .map(|(version, _)| *version)
            .unwrap_or(0)
    }
}

#[async_trait]
impl KvClient for VersionedKv {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, value)| value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, _ttl: Option<Duration>) -> StoreResult<()> {
        let mut entries = self.entries.lock().unwrap();
        let version = entries.get(key).map(|(v, _)| *v).unwrap_or(0) + 1;
        entries.insert(key.to_string(), (version, value));
        Ok(())
    }

    async fn watch(
        &self,
        key: &str,
        _ttl: Option<Duration>,
        apply: &mut WatchFn<'_>,
    ) -> StoreResult<()> {
        let watched = self.version(key);
        let current = self.get(key).await?;
        let payload = apply(current.as_deref())?;

        // Give concurrent writers a chance to interleave before commit
        tokio::task::yield_now().await;

        let mut entries = self.entries.lock().unwrap();
        let version = entries.get(key).map(|(v, _)| *v).unwrap_or(0);
        if version != watched {
            self.conflicts.fetch_add(1, Ordering::SeqCst);
            return Err(StoreError::Conflict {
                key: key.to_string(),
                attempts: 1,
            });
        }
        entries.insert(key.to_string(), (version + 1, payload));
        Ok(())
    }
}

fn backends() -> Vec<(&'static str, Arc<dyn Store>)> {
    vec![
        ("memory", Arc::new(MemoryStore::new())),
        (
            "distributed",
            Arc::new(
                DistributedStore::new(VersionedKv::default())
                    .with_key_prefix("cb")
                    .with_max_retries(1_000),
            ),
        ),
    ]
}

#[tokio::test]
async fn store_load_missing_is_not_found() {
    for (backend, store) in backends() {
        let err = store.load("missing").await.unwrap_err();
        assert!(err.is_not_found(), "{backend}: {err:?}");
    }
}

#[tokio::test]
async fn store_save_overwrites() {
    for (backend, store) in backends() {
        let first = Record {
            state: State::Open,
            failures: 5,
            ..Record::default()
        };
        let second = Record {
            state: State::HalfOpen,
            failures: 5,
            successes: 1,
            ..Record::default()
        };

        store.save("svc", &first).await.unwrap();
        store.save("svc", &second).await.unwrap();
        assert_eq!(store.load("svc").await.unwrap(), second, "{backend}");
    }
}

#[tokio::test]
async fn store_update_sees_default_when_absent() {
    for (backend, store) in backends() {
        let updated = store
            .update("fresh", &|record: Record| {
                assert_eq!(record, Record::default());
                Ok(Record {
                    successes: 1,
                    ..record
                })
            })
            .await
            .unwrap();
        assert_eq!(updated.successes, 1, "{backend}");
        assert_eq!(store.load("fresh").await.unwrap(), updated, "{backend}");
    }
}

#[tokio::test]
async fn store_update_error_leaves_value_unchanged() {
    for (backend, store) in backends() {
        let original = Record {
            failures: 2,
            ..Record::default()
        };
        store.save("svc", &original).await.unwrap();

        let err = store
            .update("svc", &|_record: Record| Err(StoreError::Decode("nope".to_string())))
            .await
            .unwrap_err();

        assert_eq!(err, StoreError::Decode("nope".to_string()), "{backend}");
        assert_eq!(store.load("svc").await.unwrap(), original, "{backend}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn store_concurrent_updates_lose_nothing() {
    for (backend, store) in backends() {
        let handles: Vec<_> = (0..40)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .update("counter", &|mut record: Record| {
                            record.failures += 1;
                            Ok(record)
                        })
                        .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(
            store.load("counter").await.unwrap().failures,
            40,
            "{backend}"
        );
    }
}

#[tokio::test]
async fn breaker_cycle_over_distributed_store() {
    let store: Arc<dyn Store> = Arc::new(DistributedStore::new(VersionedKv::default()));
    let config = BreakerConfig::new()
        .with_failure_threshold(2)
        .with_success_threshold(1)
        .with_timeout(Duration::from_millis(5));

    // Two processes' worth of breakers sharing one remote record
    let a = Breaker::with_store("payments", config.clone(), store.clone()).unwrap();
    let b = Breaker::with_store("payments", config, store).unwrap();

    let _ = a.execute(|| async { Err::<(), _>("timeout") }).await;
    let _ = b.execute(|| async { Err::<(), _>("timeout") }).await;
    assert_eq!(a.state().await.unwrap(), State::Open);

    let err = b.execute(|| async { Ok::<_, &str>(()) }).await.unwrap_err();
    assert!(err.is_circuit_open());

    tokio::time::sleep(Duration::from_millis(6)).await;
    b.execute(|| async { Ok::<_, &str>(()) }).await.unwrap();
    assert_eq!(a.state().await.unwrap(), State::Closed);
}

#[tokio::test]
async fn interleaved_failures_are_all_counted() {
    let store: Arc<dyn Store> =
        Arc::new(DistributedStore::new(VersionedKv::default()).with_max_retries(1000));
    let config = BreakerConfig::new().with_failure_threshold(100);
    let breakers: Vec<Breaker> = (0..25)
        .map(|_| Breaker::with_store("search", config.clone(), store.clone()).unwrap())
        .collect();

    // Single task: every update interleaves at the fake's commit yield
    let results = join_all(
        breakers
            .iter()
            .map(|breaker| breaker.execute(|| async { Err::<(), _>("timeout") })),
    )
    .await;

    assert!(results
        .iter()
        .all(|result| matches!(result, Err(tripwire_core::BreakerError::Operation("timeout")))));
    let record = store.load("search").await.unwrap();
    assert_eq!(record.failures, 25);
    assert_eq!(record.state, State::Closed);
}
