//! Core waitlist abstractions: parties, seat accounting and fair admission.

pub mod audit;
pub mod eligibility;
pub mod error;
pub mod notifier;
pub mod party;
pub mod store;
pub mod waitlist;

pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink,
};
pub use eligibility::{available_seats, find_eligible, select_eligible, AdmissionPolicy};
pub use error::{AppResult, WaitlistError};
pub use notifier::{Notifier, NullNotifier, WaitlistEvent};
pub use party::{
    estimate_wait, validate_party, Party, PartyId, PartyState, MIN_PARTY_SIZE, SEAT_CAPACITY,
    SERVICE_TIME_PER_PERSON_MS,
};
pub use store::{PartyStore, QueueTransaction};
pub use waitlist::{Admission, CheckInOutcome, TickOutcome, Waitlist, WaitlistLimits};
