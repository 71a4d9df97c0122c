//! API-facing request/response models for the caller layer.

use serde::{Deserialize, Serialize};

use crate::core::{
    validate_party, CheckInOutcome, Party, PartyId, PartyState, TickOutcome, WaitlistError,
};
use crate::runtime::WaitlistService;

/// Request to join the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// Display name.
    pub name: String,
    /// Seats needed.
    pub party_size: u32,
}

impl JoinRequest {
    /// Reject blank names and sizes outside `1..=capacity`.
    ///
    /// # Errors
    ///
    /// [`WaitlistError::Validation`].
    pub fn validate(&self, capacity: u32) -> Result<(), WaitlistError> {
        validate_party(&self.name, self.party_size, capacity)
    }
}

/// Response to a successful join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    /// Queue entry identifier.
    pub id: PartyId,
    /// Estimated wait in milliseconds.
    pub eta_ms: i64,
}

/// Response to a check-in attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckInResponse {
    /// The party is seated.
    CheckedIn {
        /// Updated record.
        party: Party,
    },
    /// Not the party's turn yet.
    Ineligible,
}

impl From<CheckInOutcome> for CheckInResponse {
    fn from(outcome: CheckInOutcome) -> Self {
        match outcome {
            CheckInOutcome::CheckedIn(party) => Self::CheckedIn { party },
            CheckInOutcome::Ineligible => Self::Ineligible,
        }
    }
}

/// Ids touched by one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickResponse {
    /// Released parties.
    pub checked_out: Vec<PartyId>,
    /// Parties now allowed to check in.
    pub eligible: Vec<PartyId>,
}

impl From<&TickOutcome> for TickResponse {
    fn from(outcome: &TickOutcome) -> Self {
        Self {
            checked_out: outcome.checked_out.iter().map(|p| p.id.clone()).collect(),
            eligible: outcome.eligible.iter().map(|p| p.id.clone()).collect(),
        }
    }
}

/// Occupancy and per-state counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Seat capacity.
    pub capacity: u32,
    /// Seats occupied.
    pub occupancy: u32,
    /// Parties waiting.
    pub waiting: usize,
    /// Parties seated.
    pub active: usize,
    /// Parties finished.
    pub done: usize,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
}

/// Validate and join.
///
/// # Errors
///
/// `Validation` before the engine is invoked, otherwise engine errors.
pub async fn join_party(
    service: &WaitlistService,
    req: JoinRequest,
) -> Result<JoinResponse, WaitlistError> {
    req.validate(service.waitlist().limits().seat_capacity)?;
    let admission = service.join(&req.name, req.party_size).await?;
    Ok(JoinResponse {
        id: admission.id,
        eta_ms: admission.eta.num_milliseconds(),
    })
}

/// Check a party in.
///
/// # Errors
///
/// Store failures only; ineligibility is a normal response.
pub async fn check_in_party(
    service: &WaitlistService,
    id: &PartyId,
) -> Result<CheckInResponse, WaitlistError> {
    Ok(service.check_in(id).await?.into())
}

/// Run one tick and report the affected ids.
///
/// # Errors
///
/// See [`WaitlistService::tick`].
pub async fn tick_queue(service: &WaitlistService) -> Result<TickResponse, WaitlistError> {
    let outcome = service.tick(None).await?;
    Ok(TickResponse::from(&outcome))
}

/// Current occupancy and queue composition.
///
/// # Errors
///
/// Store failures.
pub async fn queue_snapshot(service: &WaitlistService) -> Result<QueueSnapshot, WaitlistError> {
    let waitlist = service.waitlist();
    // One read, so occupancy and counts describe the same table.
    let parties = waitlist.list_by_state(None).await?;
    let count = |state: PartyState| parties.iter().filter(|p| p.state == state).count();
    let occupancy = parties
        .iter()
        .filter(|p| p.state == PartyState::Active)
        .fold(0u32, |seats, p| seats.saturating_add(p.party_size));
    Ok(QueueSnapshot {
        capacity: waitlist.limits().seat_capacity,
        occupancy,
        waiting: count(PartyState::Waiting),
        active: count(PartyState::Active),
        done: count(PartyState::Done),
    })
}

/// Return a health payload.
#[must_use]
pub const fn health() -> Health {
    Health { ok: true }
}
