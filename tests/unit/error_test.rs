//! Tests for error types

use prestoposti::core::{PartyId, WaitlistError};

#[test]
fn test_validation_error() {
    let err = WaitlistError::Validation("party size must be between 1 and 10".to_string());
    assert_eq!(
        format!("{}", err),
        "validation failed: party size must be between 1 and 10"
    );
    assert!(!err.is_retryable());
}

#[test]
fn test_capacity_exceeded_error() {
    let err = WaitlistError::CapacityExceeded {
        requested: 4,
        available: 2,
    };
    assert_eq!(
        format!("{}", err),
        "capacity exceeded: requested 4, available 2"
    );
}

#[test]
fn test_transaction_error_is_retryable() {
    let err = WaitlistError::Transaction("write conflict".to_string());
    assert_eq!(format!("{}", err), "transaction failed: write conflict");
    assert!(err.is_retryable());
    assert!(!err.is_alert());
}

#[test]
fn test_integrity_error_is_alert() {
    let err = WaitlistError::Integrity {
        expected: 3,
        modified: 2,
    };
    assert_eq!(
        format!("{}", err),
        "integrity violation: matched 3 parties but modified 2"
    );
    assert!(err.is_alert());
    assert!(!err.is_retryable());
}

#[test]
fn test_not_found_error() {
    let err = WaitlistError::NotFound(PartyId::from("abc"));
    assert_eq!(format!("{}", err), "party not found: abc");
}

#[test]
fn test_converts_into_anyhow() {
    let result: prestoposti::core::AppResult<()> =
        Err(WaitlistError::Transaction("io".to_string()).into());
    let err = result.unwrap_err();
    assert!(err.downcast_ref::<WaitlistError>().is_some());
}
