//! Tests for audit sink

use chrono::{DateTime, Utc};
use prestoposti::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink, PartyId};

fn at(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);
    let party = PartyId::from("p1");

    let event = build_audit_event(
        Some(&party),
        AuditAction::Join,
        at(1_000),
        Some("party_size=2".to_string()),
    );

    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].event_id, event.event_id);
    assert!(uuid::Uuid::parse_str(&events[0].event_id).is_ok());
    assert_eq!(events[0].party_id, Some(party));
    assert_eq!(events[0].action, AuditAction::Join);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);
    let party = PartyId::from("p1");

    sink.record(build_audit_event(Some(&party), AuditAction::Join, at(1), None));
    sink.record(build_audit_event(Some(&party), AuditAction::Eligible, at(2), None));
    sink.record(build_audit_event(Some(&party), AuditAction::CheckIn, at(3), None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].action, AuditAction::Eligible); // First one popped
    assert_eq!(events[1].action, AuditAction::CheckIn);
}

#[test]
fn test_build_batch_audit_event() {
    let event = build_audit_event(
        None,
        AuditAction::Integrity,
        at(42),
        Some("matched 2 modified 1".to_string()),
    );

    assert!(!event.event_id.is_empty());
    assert!(event.party_id.is_none());
    assert_eq!(event.created_at, at(42));
    assert_eq!(event.payload.as_deref(), Some("matched 2 modified 1"));
}

#[test]
fn test_event_ids_are_unique_within_one_instant() {
    let party = PartyId::from("p1");
    let first = build_audit_event(Some(&party), AuditAction::CheckOut, at(7), None);
    let second = build_audit_event(Some(&party), AuditAction::CheckOut, at(7), None);
    assert_ne!(first.event_id, second.event_id);

    let alert = build_audit_event(None, AuditAction::Integrity, at(7), None);
    let again = build_audit_event(None, AuditAction::Integrity, at(7), None);
    assert_ne!(alert.event_id, again.event_id);
}

#[test]
fn test_action_names() {
    assert_eq!(AuditAction::CheckIn.to_string(), "checkin");
    assert_eq!(AuditAction::CheckOut.to_string(), "checkout");
    assert_eq!(AuditAction::Seed.to_string(), "seed");
}
