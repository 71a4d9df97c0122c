//! Party records and their lifecycle states.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default restaurant seat capacity.
pub const SEAT_CAPACITY: u32 = 10;

/// Smallest party allowed to join.
pub const MIN_PARTY_SIZE: u32 = 1;

/// Default service quantum per seated person, in milliseconds.
pub const SERVICE_TIME_PER_PERSON_MS: u64 = 3_000;

/// Opaque, never reused party identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(String);

impl PartyId {
    /// Generate a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PartyId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PartyId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Lifecycle state of a party: `waiting -> active -> done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyState {
    /// Queued, not yet seated.
    Waiting,
    /// Seated and occupying seats.
    Active,
    /// Service finished; terminal.
    Done,
}

impl PartyState {
    /// Stable lowercase name used by storage backends.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Done => "done",
        }
    }

    /// Parse a stored state name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "waiting" => Some(Self::Waiting),
            "active" => Some(Self::Active),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

impl fmt::Display for PartyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One waitlist entry: a group of diners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    /// Correlation key for notifications and credentials.
    pub id: PartyId,
    /// Display name, never empty.
    pub name: String,
    /// Number of seats the party needs.
    pub party_size: u32,
    /// Current lifecycle state.
    pub state: PartyState,
    /// Arrival time; defines FIFO order among waiting parties.
    pub join_date: DateTime<Utc>,
    /// Set on `waiting -> active`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in_date: Option<DateTime<Utc>>,
    /// Set on `active -> done`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_out_date: Option<DateTime<Utc>>,
}

impl Party {
    /// New waiting party joining at `now`.
    #[must_use]
    pub fn waiting(name: impl Into<String>, party_size: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: PartyId::generate(),
            name: name.into(),
            party_size,
            state: PartyState::Waiting,
            join_date: now,
            check_in_date: None,
            check_out_date: None,
        }
    }

    /// New party seated directly at `now`, skipping the queue.
    #[must_use]
    pub fn seated(name: impl Into<String>, party_size: u32, now: DateTime<Utc>) -> Self {
        Self {
            state: PartyState::Active,
            check_in_date: Some(now),
            ..Self::waiting(name, party_size, now)
        }
    }

    /// Total service time owed to this party, saturating at `Duration::MAX`.
    #[must_use]
    pub fn service_duration(&self, quantum: Duration) -> Duration {
        estimate_wait(self.party_size, quantum)
    }

    /// Instant at which an active party's seats are released. `None` when
    /// not checked in or when the deadline lies past the representable range.
    #[must_use]
    pub fn service_deadline(&self, quantum: Duration) -> Option<DateTime<Utc>> {
        self.check_in_date?
            .checked_add_signed(self.service_duration(quantum))
    }

    /// Whether an active party's service window has elapsed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, quantum: Duration) -> bool {
        self.state == PartyState::Active
            && self
                .service_deadline(quantum)
                .is_some_and(|deadline| deadline <= now)
    }

    /// Mark seated at `now`.
    pub fn check_in(&mut self, now: DateTime<Utc>) {
        self.state = PartyState::Active;
        self.check_in_date = Some(now);
    }

    /// Mark finished at `now`.
    pub fn check_out(&mut self, now: DateTime<Utc>) {
        self.state = PartyState::Done;
        self.check_out_date = Some(now);
    }
}

/// Estimated wait for a party of `party_size`: one quantum per guest,
/// saturating at `Duration::MAX`.
#[must_use]
pub fn estimate_wait(party_size: u32, quantum: Duration) -> Duration {
    i32::try_from(party_size)
        .ok()
        .and_then(|size| quantum.checked_mul(size))
        .unwrap_or(Duration::MAX)
}

/// Check name and size against the seating limits.
///
/// # Errors
///
/// Returns [`crate::core::WaitlistError::Validation`] when the name is blank
/// or the size is outside `MIN_PARTY_SIZE..=capacity`.
pub fn validate_party(
    name: &str,
    party_size: u32,
    capacity: u32,
) -> Result<(), crate::core::WaitlistError> {
    if name.trim().is_empty() {
        return Err(crate::core::WaitlistError::Validation(
            "name must not be empty".into(),
        ));
    }
    if !(MIN_PARTY_SIZE..=capacity).contains(&party_size) {
        return Err(crate::core::WaitlistError::Validation(format!(
            "party size {party_size} outside {MIN_PARTY_SIZE}..={capacity}"
        )));
    }
    Ok(())
}
