//! Eligibility evaluation: which waiting parties may check in next.
//!
//! Fairness is strict arrival order. Candidates are walked earliest-join
//! first and admitted while their cumulative size fits the free seats; the
//! walk stops at the first party that would overflow, even if a later, smaller
//! party would still fit.

use serde::{Deserialize, Serialize};

use crate::core::{Party, QueueTransaction, WaitlistError};

/// How many parties a single evaluation may admit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionPolicy {
    /// Only the earliest fitting waiting party.
    Single,
    /// Every party in arrival order until the free seats run out.
    #[default]
    Greedy,
}

impl AdmissionPolicy {
    /// Parse a policy name (`single` or `greedy`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single" => Some(Self::Single),
            "greedy" => Some(Self::Greedy),
            _ => None,
        }
    }
}

/// Seats left once `occupied` seats are taken.
#[must_use]
pub const fn available_seats(capacity: u32, occupied: u32) -> u32 {
    capacity.saturating_sub(occupied)
}

/// Pick eligible parties from `candidates`, which must be in join order.
#[must_use]
pub fn select_eligible(
    available: u32,
    candidates: Vec<Party>,
    policy: AdmissionPolicy,
) -> Vec<Party> {
    let mut eligible = Vec::new();
    let mut admitted_seats = 0u32;
    for party in candidates {
        if admitted_seats + party.party_size > available {
            break;
        }
        admitted_seats += party.party_size;
        eligible.push(party);
        if policy == AdmissionPolicy::Single {
            break;
        }
    }
    eligible
}

/// Evaluate eligibility against the snapshot visible to `txn`.
///
/// Occupancy is always recomputed from the store, never cached.
///
/// # Errors
///
/// Propagates store failures.
pub async fn find_eligible(
    txn: &mut dyn QueueTransaction,
    capacity: u32,
    policy: AdmissionPolicy,
) -> Result<Vec<Party>, WaitlistError> {
    let occupied = txn.occupancy().await?;
    let available = available_seats(capacity, occupied);
    if available == 0 {
        tracing::debug!(occupied, "no free seats, nobody eligible");
        return Ok(Vec::new());
    }
    let candidates = txn.waiting_within(available).await?;
    let eligible = select_eligible(available, candidates, policy);
    tracing::debug!(
        occupied,
        available,
        eligible = eligible.len(),
        "evaluated eligibility"
    );
    Ok(eligible)
}
