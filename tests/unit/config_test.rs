//! Tests for configuration validation

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use prestoposti::config::{StoreBackendConfig, WaitlistConfig, MAX_PERIOD_MS};
use prestoposti::core::AdmissionPolicy;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_default_config_is_valid() {
    let config = WaitlistConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.seat_capacity, 10);
    assert_eq!(config.service_time_ms, 3_000);
    assert_eq!(config.admission, AdmissionPolicy::Greedy);
    assert_eq!(config.store, StoreBackendConfig::InMemory);
}

#[test]
fn test_invalid_seat_capacity() {
    let invalid = WaitlistConfig {
        seat_capacity: 0,
        ..WaitlistConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_invalid_service_time() {
    let invalid = WaitlistConfig {
        service_time_ms: 0,
        ..WaitlistConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_service_time_upper_bound() {
    let huge = WaitlistConfig {
        service_time_ms: 1_000_000_000_000_000,
        ..WaitlistConfig::default()
    };
    assert!(huge.validate().is_err());

    let at_limit = WaitlistConfig {
        service_time_ms: MAX_PERIOD_MS,
        ..WaitlistConfig::default()
    };
    assert!(at_limit.validate().is_ok());

    let slow_ticks = WaitlistConfig {
        tick_period_ms: Some(MAX_PERIOD_MS + 1),
        ..WaitlistConfig::default()
    };
    assert!(slow_ticks.validate().is_err());

    let env = lookup(&[("WAITLIST_SERVICE_TIME_MS", "1000000000000000")]);
    assert!(WaitlistConfig::from_lookup(env).is_err());
}

#[test]
fn test_invalid_tick_period() {
    let invalid = WaitlistConfig {
        tick_period_ms: Some(0),
        ..WaitlistConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_invalid_store_backends() {
    let empty_path = WaitlistConfig {
        store: StoreBackendConfig::File {
            path: PathBuf::new(),
            stream: "queue".to_string(),
        },
        ..WaitlistConfig::default()
    };
    assert!(empty_path.validate().is_err());

    let no_connections = WaitlistConfig {
        store: StoreBackendConfig::Postgres {
            url: "postgres://localhost/waitlist".to_string(),
            max_connections: 0,
        },
        ..WaitlistConfig::default()
    };
    assert!(no_connections.validate().is_err());
}

#[test]
fn test_tick_period_defaults_to_quantum() {
    let mut config = WaitlistConfig::default();
    assert_eq!(config.tick_period(), Duration::from_millis(3_000));
    config.tick_period_ms = Some(500);
    assert_eq!(config.tick_period(), Duration::from_millis(500));
}

#[test]
fn test_limits_from_config() {
    let config = WaitlistConfig {
        seat_capacity: 6,
        service_time_ms: 1_500,
        admission: AdmissionPolicy::Single,
        ..WaitlistConfig::default()
    };
    let limits = config.limits();
    assert_eq!(limits.seat_capacity, 6);
    assert_eq!(limits.service_time, chrono::Duration::milliseconds(1_500));
    assert_eq!(limits.admission, AdmissionPolicy::Single);
}

#[test]
fn test_from_json_str() {
    let json = r#"{
        "seat_capacity": 8,
        "admission": "single",
        "store": { "backend": "file", "path": "/var/lib/waitlist" }
    }"#;
    let config = WaitlistConfig::from_json_str(json).unwrap();
    assert_eq!(config.seat_capacity, 8);
    assert_eq!(config.service_time_ms, 3_000);
    assert_eq!(config.admission, AdmissionPolicy::Single);
    assert_eq!(
        config.store,
        StoreBackendConfig::File {
            path: PathBuf::from("/var/lib/waitlist"),
            stream: "queue".to_string(),
        }
    );
}

#[test]
fn test_from_json_str_rejects_invalid() {
    assert!(WaitlistConfig::from_json_str(r#"{ "seat_capacity": 0 }"#).is_err());
    assert!(WaitlistConfig::from_json_str("not json").is_err());
}

#[test]
fn test_from_lookup_defaults() {
    let config = WaitlistConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config, WaitlistConfig::default());
}

#[test]
fn test_from_lookup_overrides() {
    let config = WaitlistConfig::from_lookup(lookup(&[
        ("WAITLIST_SEAT_CAPACITY", "12"),
        ("WAITLIST_SERVICE_TIME_MS", "250"),
        ("WAITLIST_ADMISSION", "Single"),
        ("WAITLIST_TICK_PERIOD_MS", "100"),
        ("WAITLIST_STORE", "postgres"),
        ("DATABASE_URL", "postgres://localhost/waitlist"),
    ]))
    .unwrap();
    assert_eq!(config.seat_capacity, 12);
    assert_eq!(config.service_time_ms, 250);
    assert_eq!(config.admission, AdmissionPolicy::Single);
    assert_eq!(config.tick_period_ms, Some(100));
    assert_eq!(
        config.store,
        StoreBackendConfig::Postgres {
            url: "postgres://localhost/waitlist".to_string(),
            max_connections: 5,
        }
    );
}

#[test]
fn test_from_lookup_rejects_bad_values() {
    assert!(WaitlistConfig::from_lookup(lookup(&[("WAITLIST_SEAT_CAPACITY", "ten")])).is_err());
    assert!(WaitlistConfig::from_lookup(lookup(&[("WAITLIST_ADMISSION", "fifo")])).is_err());
    assert!(WaitlistConfig::from_lookup(lookup(&[("WAITLIST_STORE", "redis")])).is_err());
    // The file store needs a directory.
    assert!(WaitlistConfig::from_lookup(lookup(&[("WAITLIST_STORE", "file")])).is_err());
}
