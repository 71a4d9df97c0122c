//! Notifier backends.

pub mod subscriptions;

pub use subscriptions::SubscriptionTable;
