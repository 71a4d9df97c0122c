//! Audit sink implementations.
//!
//! Records every committed party transition plus integrity alerts.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::core::PartyId;

/// What happened to a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// Joined the queue.
    Join,
    /// Inserted through the administrative path.
    Seed,
    /// Became eligible to check in.
    Eligible,
    /// Seated.
    CheckIn,
    /// Released by a tick.
    CheckOut,
    /// A tick aborted on a row-count mismatch.
    Integrity,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Join => "join",
            Self::Seed => "seed",
            Self::Eligible => "eligible",
            Self::CheckIn => "checkin",
            Self::CheckOut => "checkout",
            Self::Integrity => "integrity",
        })
    }
}

/// Audit event structure.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Unique event identifier (UUID v4).
    pub event_id: String,
    /// Related party, absent for batch-level events.
    pub party_id: Option<PartyId>,
    /// Action taken.
    pub action: AuditAction,
    /// Timestamp.
    pub created_at: DateTime<Utc>,
    /// Additional context.
    pub payload: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Sink that forwards every event to `tracing` at info level.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&mut self, event: AuditEvent) {
        tracing::info!(
            target: "prestoposti::audit",
            event_id = %event.event_id,
            party = event.party_id.as_ref().map(PartyId::as_str),
            action = %event.action,
            payload = event.payload.as_deref(),
            "audit"
        );
    }
}

/// Helper to build an audit event stamped at `at`.
#[must_use]
pub fn build_audit_event(
    party_id: Option<&PartyId>,
    action: AuditAction,
    at: DateTime<Utc>,
    payload: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        party_id: party_id.cloned(),
        action,
        created_at: at,
        payload,
    }
}
