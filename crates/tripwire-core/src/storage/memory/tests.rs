
    use super::*;
    use crate::record::State;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.load("missing").await.unwrap_err();
        assert_eq!(
            err,
            StoreError::NotFound {
                name: "missing".to_string()
            }
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = MemoryStore::new();
        let record = Record {
            state: State::Open,
            failures: 4,
            ..Record::default()
        };

        store.save("svc", &record).await.unwrap();
        assert_eq!(store.load("svc").await.unwrap(), record);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_starts_from_default() {
        let store = MemoryStore::new();
        let updated = store
            .update("svc", &|mut record: Record| {
                assert_eq!(record, Record::default());
                record.failures += 1;
                Ok(record)
            })
            .await
            .unwrap();

        assert_eq!(updated.failures, 1);
        assert_eq!(store.load("svc").await.unwrap().failures, 1);
    }

    #[tokio::test]
    async fn test_update_error_writes_nothing() {
        let store = MemoryStore::new();
        let err = store
            .update("svc", &|_record: Record| {
                Err(StoreError::Backend("transform rejected".to_string()))
            })
            .await
            .unwrap_err();

        assert_eq!(err, StoreError::Backend("transform rejected".to_string()));
        assert!(store.load("svc").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .update("svc", &|mut record: Record| {
                            record.failures += 1;
                            Ok(record)
                        })
                        .await
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.load("svc").await.unwrap().failures, 50);
    }
