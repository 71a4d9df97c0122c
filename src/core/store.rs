//! Queue store abstractions.
//!
//! A [`PartyStore`] is the single source of truth for every party. Any
//! decision that depends on occupancy is made inside one
//! [`QueueTransaction`]: either every read and write in it commits together
//! or none do. Backends must make concurrent transactions linearizable with
//! respect to seat accounting.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::core::{Party, PartyId, PartyState, WaitlistError};

/// Handle to a durable collection of parties.
///
/// Constructed explicitly by the caller and passed in; `close` ends its
/// lifecycle.
#[async_trait]
pub trait PartyStore: Send + Sync {
    /// Open an all-or-nothing transaction.
    async fn begin(&self) -> Result<Box<dyn QueueTransaction>, WaitlistError>;

    /// Read one party outside of any transaction.
    async fn get(&self, id: &PartyId) -> Result<Option<Party>, WaitlistError>;

    /// Read parties in `state`, or every party, in join order.
    async fn list(&self, state: Option<PartyState>) -> Result<Vec<Party>, WaitlistError>;

    /// Remove every party. Maintenance only; core logic never deletes.
    async fn clear(&self) -> Result<(), WaitlistError>;

    /// Release backend resources.
    async fn close(&self) -> Result<(), WaitlistError>;
}

/// An open transaction against a [`PartyStore`].
///
/// Dropping a transaction without calling [`QueueTransaction::commit`]
/// discards every write made through it.
#[async_trait]
pub trait QueueTransaction: Send {
    /// Insert one party.
    async fn insert(&mut self, party: Party) -> Result<(), WaitlistError>;

    /// Read one party.
    async fn get(&mut self, id: &PartyId) -> Result<Option<Party>, WaitlistError>;

    /// Sum of `party_size` over active parties; 0 when none are active.
    async fn occupancy(&mut self) -> Result<u32, WaitlistError>;

    /// Waiting parties with `party_size <= max_size`, earliest join first.
    async fn waiting_within(&mut self, max_size: u32) -> Result<Vec<Party>, WaitlistError>;

    /// Active parties whose service window has elapsed at `now`.
    async fn find_expired(
        &mut self,
        now: DateTime<Utc>,
        quantum: Duration,
    ) -> Result<Vec<Party>, WaitlistError>;

    /// Move every expired active party to `done`; returns rows modified.
    async fn check_out_expired(
        &mut self,
        now: DateTime<Utc>,
        quantum: Duration,
    ) -> Result<u64, WaitlistError>;

    /// Move one waiting party to `active`; returns rows modified.
    async fn check_in(&mut self, id: &PartyId, now: DateTime<Utc>) -> Result<u64, WaitlistError>;

    /// Make every write visible atomically.
    async fn commit(self: Box<Self>) -> Result<(), WaitlistError>;

    /// Discard every write.
    async fn rollback(self: Box<Self>) -> Result<(), WaitlistError>;
}
