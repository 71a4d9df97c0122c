//! Waitlist engine: admission, time-driven release and check-in.
//!
//! Every operation that reads occupancy and then writes based on it runs in
//! exactly one store transaction. Notification fan-out is not done here; it
//! belongs to the caller and happens strictly after commit (see
//! [`crate::runtime::WaitlistService`]).

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::core::eligibility::{available_seats, find_eligible, AdmissionPolicy};
use crate::core::{
    estimate_wait, validate_party, Party, PartyId, PartyState, PartyStore, QueueTransaction,
    WaitlistError, SEAT_CAPACITY, SERVICE_TIME_PER_PERSON_MS,
};
use crate::util::clock::{millis, Clock, SystemClock};

/// Seating limits and fairness policy.
#[derive(Debug, Clone, Copy)]
pub struct WaitlistLimits {
    /// Maximum seats occupied at once.
    pub seat_capacity: u32,
    /// Service quantum per seated person.
    pub service_time: Duration,
    /// How many parties one evaluation may admit.
    pub admission: AdmissionPolicy,
}

impl Default for WaitlistLimits {
    fn default() -> Self {
        Self {
            seat_capacity: SEAT_CAPACITY,
            service_time: millis(SERVICE_TIME_PER_PERSON_MS),
            admission: AdmissionPolicy::default(),
        }
    }
}

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// Identifier of the new party.
    pub id: PartyId,
    /// Estimated wait before the party can be seated.
    pub eta: Duration,
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    /// Parties released this tick, as they were before the update.
    pub checked_out: Vec<Party>,
    /// Waiting parties that may now check in.
    pub eligible: Vec<Party>,
    /// Instant the tick was evaluated at.
    pub now: DateTime<Utc>,
}

impl TickOutcome {
    /// True when the tick neither released nor admitted anyone.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.checked_out.is_empty() && self.eligible.is_empty()
    }
}

/// Result of a check-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// The party is now active.
    CheckedIn(Party),
    /// Not the party's turn; nothing changed.
    Ineligible,
}

/// The waitlist scheduling engine.
pub struct Waitlist {
    limits: WaitlistLimits,
    store: Arc<dyn PartyStore>,
    clock: Arc<dyn Clock>,
    /// Serializes ticks issued through this engine.
    tick_gate: tokio::sync::Mutex<()>,
}

impl Waitlist {
    /// Create an engine over `store` using the wall clock.
    pub fn new(limits: WaitlistLimits, store: Arc<dyn PartyStore>) -> Self {
        Self {
            limits,
            store,
            clock: Arc::new(SystemClock),
            tick_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Configured limits.
    #[must_use]
    pub const fn limits(&self) -> &WaitlistLimits {
        &self.limits
    }

    /// Current instant according to the engine's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Add a waiting party and return its id and ETA.
    ///
    /// The ETA only depends on the party's own size: it waits for roughly
    /// its own size's worth of service quanta to free up.
    ///
    /// # Errors
    ///
    /// `Validation` for bad input, `Transaction` if the insert did not commit.
    pub async fn join(&self, name: &str, party_size: u32) -> Result<Admission, WaitlistError> {
        validate_party(name, party_size, self.limits.seat_capacity)?;
        let party = Party::waiting(name.trim(), party_size, self.clock.now());
        let id = party.id.clone();

        let mut txn = self.store.begin().await?;
        if let Err(e) = txn.insert(party).await {
            abort(txn, &e).await;
            return Err(e);
        }
        commit(txn).await?;

        let eta = estimate_wait(party_size, self.limits.service_time);
        tracing::info!(party = %id, party_size, eta_ms = eta.num_milliseconds(), "party joined");
        Ok(Admission { id, eta })
    }

    /// Administrative insert that skips the queue.
    ///
    /// An `Active` party is seated immediately but still may not push
    /// occupancy past capacity.
    ///
    /// # Errors
    ///
    /// `Validation`, `CapacityExceeded`, or `Transaction`.
    pub async fn seed(
        &self,
        name: &str,
        party_size: u32,
        state: PartyState,
    ) -> Result<Party, WaitlistError> {
        validate_party(name, party_size, self.limits.seat_capacity)?;
        let now = self.clock.now();
        let party = match state {
            PartyState::Waiting => Party::waiting(name.trim(), party_size, now),
            PartyState::Active => Party::seated(name.trim(), party_size, now),
            PartyState::Done => {
                let mut party = Party::seated(name.trim(), party_size, now);
                party.check_out(now);
                party
            }
        };

        let mut txn = self.store.begin().await?;
        match self.seed_in(txn.as_mut(), &party).await {
            Ok(()) => commit(txn).await?,
            Err(e) => {
                abort(txn, &e).await;
                return Err(e);
            }
        }
        tracing::info!(party = %party.id, party_size, state = %party.state, "party seeded");
        Ok(party)
    }

    async fn seed_in(
        &self,
        txn: &mut dyn QueueTransaction,
        party: &Party,
    ) -> Result<(), WaitlistError> {
        if party.state == PartyState::Active {
            let occupied = txn.occupancy().await?;
            let available = available_seats(self.limits.seat_capacity, occupied);
            if party.party_size > available {
                return Err(WaitlistError::CapacityExceeded {
                    requested: party.party_size,
                    available,
                });
            }
        }
        txn.insert(party.clone()).await
    }

    /// Waiting parties that may check in right now.
    ///
    /// # Errors
    ///
    /// `Transaction` if the snapshot could not be read.
    pub async fn find_eligible(&self) -> Result<Vec<Party>, WaitlistError> {
        let mut txn = self.store.begin().await?;
        match find_eligible(txn.as_mut(), self.limits.seat_capacity, self.limits.admission).await {
            Ok(eligible) => {
                commit(txn).await?;
                Ok(eligible)
            }
            Err(e) => {
                abort(txn, &e).await;
                Err(e)
            }
        }
    }

    /// Release expired parties and re-evaluate eligibility.
    ///
    /// `now` defaults to the engine clock. Ticks through one engine are
    /// serialized; a tick that finds nothing expired reports an empty
    /// `checked_out`.
    ///
    /// # Errors
    ///
    /// `Transaction` when the store failed (treat as a no-op cycle and retry
    /// on the next tick), `Integrity` when the release touched a different
    /// number of rows than it matched.
    pub async fn tick(&self, now: Option<DateTime<Utc>>) -> Result<TickOutcome, WaitlistError> {
        let _gate = self.tick_gate.lock().await;
        self.tick_locked(now.unwrap_or_else(|| self.clock.now())).await
    }

    /// Like [`Waitlist::tick`], but returns `None` instead of waiting when
    /// another tick is still running.
    pub async fn try_tick(
        &self,
        now: Option<DateTime<Utc>>,
    ) -> Option<Result<TickOutcome, WaitlistError>> {
        let Ok(_gate) = self.tick_gate.try_lock() else {
            tracing::warn!("previous tick still running, skipping");
            return None;
        };
        Some(self.tick_locked(now.unwrap_or_else(|| self.clock.now())).await)
    }

    async fn tick_locked(&self, now: DateTime<Utc>) -> Result<TickOutcome, WaitlistError> {
        let mut txn = self.store.begin().await?;
        match self.tick_in(txn.as_mut(), now).await {
            Ok(outcome) => {
                commit(txn).await?;
                if !outcome.is_idle() {
                    tracing::info!(
                        checked_out = outcome.checked_out.len(),
                        eligible = outcome.eligible.len(),
                        "tick committed"
                    );
                }
                Ok(outcome)
            }
            Err(e) => {
                if e.is_alert() {
                    tracing::error!(error = %e, "tick aborted on integrity violation");
                }
                abort(txn, &e).await;
                Err(e)
            }
        }
    }

    async fn tick_in(
        &self,
        txn: &mut dyn QueueTransaction,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome, WaitlistError> {
        let quantum = self.limits.service_time;
        let checked_out = txn.find_expired(now, quantum).await?;
        let modified = txn.check_out_expired(now, quantum).await?;
        let expected = checked_out.len() as u64;
        if modified != expected {
            return Err(WaitlistError::Integrity { expected, modified });
        }
        for party in &checked_out {
            tracing::info!(party = %party.id, party_size = party.party_size, "party checked out");
        }

        let eligible = find_eligible(txn, self.limits.seat_capacity, self.limits.admission).await?;
        Ok(TickOutcome {
            checked_out,
            eligible,
            now,
        })
    }

    /// Seat a party, re-validating its eligibility inside the transaction.
    ///
    /// # Errors
    ///
    /// `Transaction` on store failure. An ineligible party is reported as
    /// [`CheckInOutcome::Ineligible`], not as an error.
    pub async fn check_in(&self, id: &PartyId) -> Result<CheckInOutcome, WaitlistError> {
        let mut txn = self.store.begin().await?;
        match self.check_in_in(txn.as_mut(), id).await {
            Ok(Some(party)) => {
                commit(txn).await?;
                tracing::info!(
                    party = %party.id,
                    party_size = party.party_size,
                    "party checked in"
                );
                Ok(CheckInOutcome::CheckedIn(party))
            }
            Ok(None) => {
                txn.rollback().await?;
                tracing::warn!(party = %id, "ineligible check in");
                Ok(CheckInOutcome::Ineligible)
            }
            Err(e) => {
                abort(txn, &e).await;
                Err(e)
            }
        }
    }

    async fn check_in_in(
        &self,
        txn: &mut dyn QueueTransaction,
        id: &PartyId,
    ) -> Result<Option<Party>, WaitlistError> {
        let eligible = find_eligible(txn, self.limits.seat_capacity, self.limits.admission).await?;
        if !eligible.iter().any(|party| &party.id == id) {
            return Ok(None);
        }

        let modified = txn.check_in(id, self.clock.now()).await?;
        if modified != 1 {
            return Err(WaitlistError::Transaction(format!(
                "check in of {id} modified {modified} rows"
            )));
        }
        txn.get(id)
            .await?
            .map(Some)
            .ok_or_else(|| WaitlistError::NotFound(id.clone()))
    }

    /// Parties in `state`, or all parties.
    ///
    /// # Errors
    ///
    /// `Transaction` on store failure.
    pub async fn list_by_state(
        &self,
        state: Option<PartyState>,
    ) -> Result<Vec<Party>, WaitlistError> {
        self.store.list(state).await
    }

    /// One party by id.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `Transaction` on store failure.
    pub async fn get(&self, id: &PartyId) -> Result<Party, WaitlistError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| WaitlistError::NotFound(id.clone()))
    }

    /// Seats currently occupied.
    ///
    /// # Errors
    ///
    /// `Transaction` on store failure.
    pub async fn occupancy(&self) -> Result<u32, WaitlistError> {
        let mut txn = self.store.begin().await?;
        match txn.occupancy().await {
            Ok(occupied) => {
                commit(txn).await?;
                Ok(occupied)
            }
            Err(e) => {
                abort(txn, &e).await;
                Err(e)
            }
        }
    }

    /// Remove every party. Seeding and tests only.
    ///
    /// # Errors
    ///
    /// `Transaction` on store failure.
    pub async fn clear(&self) -> Result<(), WaitlistError> {
        self.store.clear().await
    }

    /// Close the underlying store.
    ///
    /// # Errors
    ///
    /// `Transaction` if the backend failed to shut down cleanly.
    pub async fn close(&self) -> Result<(), WaitlistError> {
        self.store.close().await
    }
}

async fn commit(txn: Box<dyn QueueTransaction>) -> Result<(), WaitlistError> {
    txn.commit()
        .await
        .inspect_err(|e| tracing::error!(error = %e, "commit failed"))
}

/// Roll back after `cause`, logging rather than masking a rollback failure.
async fn abort(txn: Box<dyn QueueTransaction>, cause: &WaitlistError) {
    if let Err(e) = txn.rollback().await {
        tracing::error!(cause = %cause, error = %e, "rollback failed");
    } else {
        tracing::debug!(cause = %cause, "transaction rolled back");
    }
}
