//! In-memory party store with serialized, all-or-nothing transactions.
//!
//! A transaction owns the table lock for its whole lifetime and works on a
//! private copy; commit swaps the copy in, drop or rollback discards it. This
//! makes every transaction linearizable within one process. Commits that
//! changed nothing leave the table and its journal untouched.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::core::{Party, PartyId, PartyState, PartyStore, QueueTransaction, WaitlistError};
use crate::infra::store::file::Journal;

/// Party rows in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct PartyTable {
    parties: Vec<Party>,
}

impl PartyTable {
    pub(crate) const fn from_parties(parties: Vec<Party>) -> Self {
        Self { parties }
    }

    pub(crate) fn parties(&self) -> &[Party] {
        &self.parties
    }

    fn find(&self, id: &PartyId) -> Option<&Party> {
        self.parties.iter().find(|p| &p.id == id)
    }

    fn insert(&mut self, party: Party) -> Result<(), WaitlistError> {
        if self.find(&party.id).is_some() {
            return Err(WaitlistError::Transaction(format!(
                "duplicate party id {}",
                party.id
            )));
        }
        self.parties.push(party);
        Ok(())
    }

    fn in_state(&self, state: Option<PartyState>) -> Vec<Party> {
        let mut matched: Vec<Party> = self
            .parties
            .iter()
            .filter(|p| state.is_none_or(|s| p.state == s))
            .cloned()
            .collect();
        // Stable: equal join dates keep insertion order.
        matched.sort_by_key(|p| p.join_date);
        matched
    }

    fn occupancy(&self) -> u32 {
        self.parties
            .iter()
            .filter(|p| p.state == PartyState::Active)
            .map(|p| p.party_size)
            .sum()
    }
}

/// Process-local store. Cloning yields another handle to the same table.
#[derive(Clone, Default)]
pub struct InMemoryPartyStore {
    table: Arc<Mutex<PartyTable>>,
    journal: Option<Arc<Journal>>,
}

impl InMemoryPartyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose commits are persisted to `journal`.
    pub(crate) fn with_journal(table: PartyTable, journal: Journal) -> Self {
        Self {
            table: Arc::new(Mutex::new(table)),
            journal: Some(Arc::new(journal)),
        }
    }

    fn persist(&self, table: &PartyTable) -> Result<(), WaitlistError> {
        self.journal
            .as_ref()
            .map_or(Ok(()), |journal| journal.rewrite(table))
    }
}

#[async_trait]
impl PartyStore for InMemoryPartyStore {
    async fn begin(&self) -> Result<Box<dyn QueueTransaction>, WaitlistError> {
        let guard = Arc::clone(&self.table).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard,
            working,
            dirty: false,
            journal: self.journal.clone(),
        }))
    }

    async fn get(&self, id: &PartyId) -> Result<Option<Party>, WaitlistError> {
        Ok(self.table.lock().await.find(id).cloned())
    }

    async fn list(&self, state: Option<PartyState>) -> Result<Vec<Party>, WaitlistError> {
        Ok(self.table.lock().await.in_state(state))
    }

    async fn clear(&self) -> Result<(), WaitlistError> {
        let mut table = self.table.lock().await;
        let cleared = PartyTable::default();
        self.persist(&cleared)?;
        *table = cleared;
        Ok(())
    }

    async fn close(&self) -> Result<(), WaitlistError> {
        let table = self.table.lock().await;
        self.persist(&table)
    }
}

/// Transaction over an [`InMemoryPartyStore`].
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<PartyTable>,
    working: PartyTable,
    /// Set once `working` diverges from the committed table.
    dirty: bool,
    journal: Option<Arc<Journal>>,
}

#[async_trait]
impl QueueTransaction for MemoryTransaction {
    async fn insert(&mut self, party: Party) -> Result<(), WaitlistError> {
        self.working.insert(party)?;
        self.dirty = true;
        Ok(())
    }

    async fn get(&mut self, id: &PartyId) -> Result<Option<Party>, WaitlistError> {
        Ok(self.working.find(id).cloned())
    }

    async fn occupancy(&mut self) -> Result<u32, WaitlistError> {
        Ok(self.working.occupancy())
    }

    async fn waiting_within(&mut self, max_size: u32) -> Result<Vec<Party>, WaitlistError> {
        let mut waiting = self.working.in_state(Some(PartyState::Waiting));
        waiting.retain(|p| p.party_size <= max_size);
        Ok(waiting)
    }

    async fn find_expired(
        &mut self,
        now: DateTime<Utc>,
        quantum: Duration,
    ) -> Result<Vec<Party>, WaitlistError> {
        Ok(self
            .working
            .parties
            .iter()
            .filter(|p| p.is_expired(now, quantum))
            .cloned()
            .collect())
    }

    async fn check_out_expired(
        &mut self,
        now: DateTime<Utc>,
        quantum: Duration,
    ) -> Result<u64, WaitlistError> {
        let mut modified = 0;
        for party in &mut self.working.parties {
            if party.is_expired(now, quantum) {
                party.check_out(now);
                modified += 1;
            }
        }
        self.dirty |= modified > 0;
        Ok(modified)
    }

    async fn check_in(&mut self, id: &PartyId, now: DateTime<Utc>) -> Result<u64, WaitlistError> {
        let Some(party) = self
            .working
            .parties
            .iter_mut()
            .find(|p| &p.id == id && p.state == PartyState::Waiting)
        else {
            return Ok(0);
        };
        party.check_in(now);
        self.dirty = true;
        Ok(1)
    }

    async fn commit(self: Box<Self>) -> Result<(), WaitlistError> {
        let Self {
            mut guard,
            working,
            dirty,
            journal,
        } = *self;
        if !dirty {
            return Ok(());
        }
        if let Some(journal) = journal {
            journal.rewrite(&working)?;
        }
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), WaitlistError> {
        Ok(())
    }
}
