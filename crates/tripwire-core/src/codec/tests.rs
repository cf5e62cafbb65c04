
    use super::*;
    use crate::record::State;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_round_trip_with_failure_time() {
        let codec = JsonCodec;
        let record = Record {
            state: State::Open,
            failures: 5,
            successes: 0,
            last_failure_time: Some(Utc.with_ymd_and_hms(2026, 1, 4, 10, 0, 0).unwrap()),
        };

        let bytes = codec.encode(&record).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), record);
    }

    #[test]
    fn test_round_trip_without_failure_time() {
        let codec = JsonCodec;
        let record = Record {
            state: State::HalfOpen,
            failures: 2,
            successes: 1,
            last_failure_time: None,
        };

        let bytes = codec.encode(&record).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), record);
    }

    #[test]
    fn test_state_encoded_as_integer() {
        let record = Record {
            state: State::HalfOpen,
            ..Record::default()
        };
        let value: serde_json::Value =
            serde_json::from_slice(&JsonCodec.encode(&record).unwrap()).unwrap();
        assert_eq!(value["state"], 2);
        assert_eq!(value["failures"], 0);
    }

    #[test]
    fn test_empty_input_is_not_found() {
        let err = JsonCodec.decode(b"").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_malformed_input_is_decode_error() {
        let err = JsonCodec.decode(b"{not json").unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn test_missing_fields_decode_to_zero_values() {
        let record = JsonCodec.decode(br#"{"failures":3}"#).unwrap();
        assert_eq!(record.state, State::Closed);
        assert_eq!(record.failures, 3);
        assert_eq!(record.successes, 0);
        assert!(record.last_failure_time.is_none());
    }

    #[test]
    fn test_unknown_state_is_preserved_for_normalization() {
        let record = JsonCodec.decode(br#"{"state":7,"failures":1}"#).unwrap();
        assert_eq!(record.state, State::Unrecognized(7));
        assert_eq!(record.normalized(), Record::default());
    }

    #[test]
    fn test_legacy_zero_timestamp_is_unset() {
        let record = JsonCodec
            .decode(br#"{"state":0,"failures":0,"successes":0,"last_failure_time":"0001-01-01T00:00:00Z"}"#)
            .unwrap();
        assert!(record.last_failure_time.is_none());
    }

    #[test]
    fn test_null_timestamp_is_unset() {
        let record = JsonCodec
            .decode(br#"{"state":1,"last_failure_time":null}"#)
            .unwrap();
        assert_eq!(record.state, State::Open);
        assert!(record.last_failure_time.is_none());
    }
