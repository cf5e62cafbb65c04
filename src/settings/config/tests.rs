
    use super::*;
    use config::{Config, File, FileFormat};
    use tripwire_core::State;

    fn parse(overrides: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(
                crate::settings::loader::DEFAULT_CONFIG,
                FileFormat::Toml,
            ))
            .add_source(File::from_str(overrides, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_embedded_defaults() {
        let config = parse("");
        assert_eq!(config.breaker.failure_threshold, 5);
        assert_eq!(config.breaker.success_threshold, 2);
        assert_eq!(config.breaker.timeout_ms, 60_000);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.key_prefix, "tripwire");
        assert_eq!(config.storage.max_retries, 3);
        assert_eq!(config.storage.ttl(), None);
    }

    #[test]
    fn test_overrides() {
        let config = parse(
            r#"
            [breaker]
            failure_threshold = 3
            timeout_ms = 1500

            [storage]
            backend = "redis"
            ttl_secs = 600
            "#,
        );

        let breaker = config.breaker.to_config();
        assert_eq!(breaker.failure_threshold, 3);
        assert_eq!(breaker.success_threshold, 2);
        assert_eq!(breaker.timeout, Duration::from_millis(1500));
        assert_eq!(config.storage.backend, StorageBackend::Redis);
        assert_eq!(config.storage.ttl(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: AppConfig = Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.breaker.failure_threshold, 5);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_zero_threshold_rejected_by_breaker() {
        let config = parse("[breaker]\nfailure_threshold = 0\n");
        let err = config.breaker("svc").unwrap_err();
        assert!(format!("{:#}", err).contains("failure_threshold"));
    }

    #[test]
    fn test_invalid_redis_url() {
        let config = parse("[storage]\nbackend = \"redis\"\nredis_url = \"not a url\"\n");
        assert!(config.storage.open_store().is_err());
    }

    #[tokio::test]
    async fn test_memory_breaker() {
        let breaker = parse("").breaker("svc").unwrap();
        assert_eq!(breaker.name(), "svc");
        assert_eq!(breaker.state().await.unwrap(), State::Closed);
    }
