//! Error types for waitlist operations.

use thiserror::Error;

use crate::core::PartyId;

/// Errors produced by waitlist components.
///
/// Ineligible check-ins are not errors; see [`crate::core::CheckInOutcome`].
#[derive(Debug, Error)]
pub enum WaitlistError {
    /// Caller supplied malformed input (empty name, party size out of range).
    #[error("validation failed: {0}")]
    Validation(String),
    /// Seating the party would push occupancy past seat capacity.
    #[error("capacity exceeded: requested {requested}, available {available}")]
    CapacityExceeded {
        /// Seats requested by the party.
        requested: u32,
        /// Seats currently free.
        available: u32,
    },
    /// The store could not commit the operation (contention, connectivity, I/O).
    #[error("transaction failed: {0}")]
    Transaction(String),
    /// A tick modified a different number of rows than it matched.
    #[error("integrity violation: matched {expected} parties but modified {modified}")]
    Integrity {
        /// Parties captured before the update.
        expected: u64,
        /// Rows the update reported as modified.
        modified: u64,
    },
    /// No party with the given id exists.
    #[error("party not found: {0}")]
    NotFound(PartyId),
}

impl WaitlistError {
    /// Whether the caller should simply try again (e.g. on the next tick).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transaction(_))
    }

    /// Whether the error signals a defect that needs operational attention.
    #[must_use]
    pub const fn is_alert(&self) -> bool {
        matches!(self, Self::Integrity { .. })
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
