//! Notification capability consumed by the waitlist.
//!
//! The engine never owns connections. Callers hand it something that
//! implements [`Notifier`]; delivery is fire-and-forget and at-most-once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Party, PartyId};

/// Event pushed to a connected party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WaitlistEvent {
    /// The party may now check in.
    Eligibility {
        /// Seats the party will take.
        #[serde(rename = "partySize")]
        party_size: u32,
        /// Always `true`.
        eligible: bool,
    },
    /// The party has been seated.
    #[serde(rename = "checkin")]
    CheckIn {
        /// Seats the party took.
        #[serde(rename = "partySize")]
        party_size: u32,
        /// When service started.
        #[serde(rename = "checkInDate")]
        check_in_date: DateTime<Utc>,
    },
    /// The party's service time is over.
    #[serde(rename = "checkout")]
    CheckOut {
        /// When the seats were released.
        #[serde(rename = "checkOutDate")]
        check_out_date: DateTime<Utc>,
    },
}

impl WaitlistEvent {
    /// Eligibility event for `party`.
    #[must_use]
    pub const fn eligibility(party: &Party) -> Self {
        Self::Eligibility {
            party_size: party.party_size,
            eligible: true,
        }
    }

    /// Check-in event for a party that is now active.
    #[must_use]
    pub fn check_in(party: &Party, fallback: DateTime<Utc>) -> Self {
        Self::CheckIn {
            party_size: party.party_size,
            check_in_date: party.check_in_date.unwrap_or(fallback),
        }
    }

    /// Check-out event; `at` is the instant of the releasing tick.
    #[must_use]
    pub fn check_out(party: &Party, at: DateTime<Utc>) -> Self {
        Self::CheckOut {
            check_out_date: party.check_out_date.unwrap_or(at),
        }
    }

    /// Short name of the event kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Eligibility { .. } => "eligibility",
            Self::CheckIn { .. } => "checkin",
            Self::CheckOut { .. } => "checkout",
        }
    }
}

/// Delivers events to whoever listens for a party.
pub trait Notifier: Send + Sync {
    /// Deliver `event` to `party`. Must not block; failures are the
    /// notifier's concern.
    fn notify(&self, party: &PartyId, event: WaitlistEvent);
}

/// Notifier that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _party: &PartyId, _event: WaitlistEvent) {}
}
