
    use super::*;

    #[test]
    fn test_store_error_predicates() {
        let not_found = StoreError::NotFound {
            name: "payments".to_string(),
        };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_conflict());

        let conflict = StoreError::Conflict {
            key: "cb:payments".to_string(),
            attempts: 4,
        };
        assert!(conflict.is_conflict());
        assert_eq!(
            conflict.to_string(),
            "storage record update conflict on 'cb:payments' after 4 attempt(s)"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("failure_threshold", "must be greater than zero");
        assert_eq!(
            err.to_string(),
            "invalid configuration: failure_threshold: must be greater than zero"
        );
    }

    #[test]
    fn test_combined_error_keeps_both_causes() {
        let err: BreakerError<std::io::Error> = BreakerError::Combined {
            operation: std::io::Error::new(std::io::ErrorKind::Other, "upstream down"),
            storage: StoreError::Backend("connection reset".to_string()),
        };

        assert_eq!(err.operation_error().unwrap().to_string(), "upstream down");
        assert_eq!(
            err.storage_error(),
            Some(&StoreError::Backend("connection reset".to_string()))
        );

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "storage backend error: connection reset");
        assert!(err.to_string().contains("upstream down"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_circuit_open_has_no_causes() {
        let err: BreakerError<String> = BreakerError::CircuitOpen {
            name: "search".to_string(),
        };
        assert!(err.is_circuit_open());
        assert!(err.operation_error().is_none());
        assert!(err.storage_error().is_none());
        assert_eq!(err.to_string(), "circuit breaker 'search' is open");
    }

    #[test]
    fn test_into_operation_error() {
        let err: BreakerError<String> = BreakerError::Operation("boom".to_string());
        assert_eq!(err.into_operation_error(), Some("boom".to_string()));

        let err: BreakerError<String> = BreakerError::NilFunction;
        assert_eq!(err.into_operation_error(), None);
    }
