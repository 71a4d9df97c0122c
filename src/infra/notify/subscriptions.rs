//! Subscription table keyed by party id.
//!
//! Each connected client registers an unbounded channel for its party. A
//! delivery to a closed channel removes the subscription; disconnects should
//! also call [`SubscriptionTable::unsubscribe`] explicitly.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::core::{Notifier, PartyId, WaitlistEvent};

/// Registry of live subscribers.
#[derive(Default)]
pub struct SubscriptionTable {
    subscribers: RwLock<HashMap<PartyId, UnboundedSender<WaitlistEvent>>>,
}

impl SubscriptionTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `party`, replacing any previous one.
    pub fn subscribe(&self, party: PartyId) -> UnboundedReceiver<WaitlistEvent> {
        let (tx, rx) = unbounded_channel();
        if self.subscribers.write().insert(party.clone(), tx).is_some() {
            tracing::debug!(party = %party, "replaced existing subscription");
        }
        rx
    }

    /// Remove the listener for `party`. Returns whether one was registered.
    pub fn unsubscribe(&self, party: &PartyId) -> bool {
        self.subscribers.write().remove(party).is_some()
    }

    /// Whether `party` has a listener.
    #[must_use]
    pub fn is_subscribed(&self, party: &PartyId) -> bool {
        self.subscribers.read().contains_key(party)
    }

    /// Remove the listener for `party` only if its receiver is gone. A live
    /// listener registered since the failed send is kept.
    fn remove_if_closed(&self, party: &PartyId) -> bool {
        let mut subscribers = self.subscribers.write();
        if subscribers.get(party).is_some_and(UnboundedSender::is_closed) {
            subscribers.remove(party);
            return true;
        }
        false
    }

    /// Drop every subscription whose receiver has gone away.
    pub fn prune_closed(&self) -> usize {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|_, tx| !tx.is_closed());
        before - subscribers.len()
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for SubscriptionTable {
    fn notify(&self, party: &PartyId, event: WaitlistEvent) {
        let delivered = {
            let subscribers = self.subscribers.read();
            match subscribers.get(party) {
                Some(tx) => tx.send(event).is_ok(),
                None => {
                    tracing::debug!(party = %party, kind = event.kind(), "no subscriber");
                    return;
                }
            }
        };
        if !delivered && self.remove_if_closed(party) {
            tracing::debug!(party = %party, "subscriber gone, removed");
        }
    }
}
