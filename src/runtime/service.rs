//! Service facade: engine operations plus post-commit fan-out.
//!
//! Notifications and audit records are emitted only after the engine has
//! committed, and never while a transaction is open.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::core::{
    build_audit_event, Admission, AuditAction, AuditSink, CheckInOutcome, Notifier, Party,
    PartyId, PartyState, TickOutcome, Waitlist, WaitlistError, WaitlistEvent,
};

/// Waitlist engine wired to a notifier and an optional audit sink.
pub struct WaitlistService {
    waitlist: Arc<Waitlist>,
    notifier: Arc<dyn Notifier>,
    audit: Option<Arc<Mutex<Box<dyn AuditSink>>>>,
}

impl WaitlistService {
    /// Wrap `waitlist`, delivering events through `notifier`.
    pub fn new(waitlist: Arc<Waitlist>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            waitlist,
            notifier,
            audit: None,
        }
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Arc::new(Mutex::new(audit)));
        self
    }

    /// The wrapped engine.
    #[must_use]
    pub const fn waitlist(&self) -> &Arc<Waitlist> {
        &self.waitlist
    }

    /// Join the queue. No notification is sent on join.
    ///
    /// # Errors
    ///
    /// See [`Waitlist::join`].
    pub async fn join(&self, name: &str, party_size: u32) -> Result<Admission, WaitlistError> {
        let admission = self.waitlist.join(name, party_size).await?;
        self.record(
            Some(&admission.id),
            AuditAction::Join,
            Some(format!("party_size={party_size}")),
        );
        Ok(admission)
    }

    /// Administrative insert.
    ///
    /// # Errors
    ///
    /// See [`Waitlist::seed`].
    pub async fn seed(
        &self,
        name: &str,
        party_size: u32,
        state: PartyState,
    ) -> Result<Party, WaitlistError> {
        let party = self.waitlist.seed(name, party_size, state).await?;
        self.record(Some(&party.id), AuditAction::Seed, Some(format!("state={state}")));
        Ok(party)
    }

    /// Check a party in and tell it so.
    ///
    /// # Errors
    ///
    /// See [`Waitlist::check_in`].
    pub async fn check_in(&self, id: &PartyId) -> Result<CheckInOutcome, WaitlistError> {
        let outcome = self.waitlist.check_in(id).await?;
        if let CheckInOutcome::CheckedIn(party) = &outcome {
            self.notifier
                .notify(&party.id, WaitlistEvent::check_in(party, self.waitlist.now()));
            self.record(Some(&party.id), AuditAction::CheckIn, None);
        }
        Ok(outcome)
    }

    /// Run one tick and fan out its results.
    ///
    /// # Errors
    ///
    /// See [`Waitlist::tick`].
    pub async fn tick(&self, now: Option<DateTime<Utc>>) -> Result<TickOutcome, WaitlistError> {
        let result = self.waitlist.tick(now).await;
        self.after_tick(result)
    }

    /// Run one tick unless another is in flight.
    pub async fn try_tick(
        &self,
        now: Option<DateTime<Utc>>,
    ) -> Option<Result<TickOutcome, WaitlistError>> {
        let result = self.waitlist.try_tick(now).await?;
        Some(self.after_tick(result))
    }

    fn after_tick(
        &self,
        result: Result<TickOutcome, WaitlistError>,
    ) -> Result<TickOutcome, WaitlistError> {
        match result {
            Ok(outcome) => {
                self.fan_out(&outcome);
                Ok(outcome)
            }
            Err(e) => {
                if e.is_alert() {
                    self.record(None, AuditAction::Integrity, Some(e.to_string()));
                }
                Err(e)
            }
        }
    }

    /// One checkout event per released party, one eligibility event per
    /// eligible party.
    fn fan_out(&self, outcome: &TickOutcome) {
        let at = outcome.now;
        for party in &outcome.checked_out {
            self.notifier
                .notify(&party.id, WaitlistEvent::check_out(party, at));
            self.record(Some(&party.id), AuditAction::CheckOut, None);
        }
        for party in &outcome.eligible {
            self.notifier
                .notify(&party.id, WaitlistEvent::eligibility(party));
            self.record(Some(&party.id), AuditAction::Eligible, None);
        }
    }

    /// Parties in `state`, or all parties.
    ///
    /// # Errors
    ///
    /// See [`Waitlist::list_by_state`].
    pub async fn list_by_state(
        &self,
        state: Option<PartyState>,
    ) -> Result<Vec<Party>, WaitlistError> {
        self.waitlist.list_by_state(state).await
    }

    fn record(&self, party: Option<&PartyId>, action: AuditAction, payload: Option<String>) {
        if let Some(audit) = &self.audit {
            audit
                .lock()
                .record(build_audit_event(party, action, self.waitlist.now(), payload));
        }
    }
}
