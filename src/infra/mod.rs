//! Infrastructure adapters for party stores and notifiers.

pub mod notify;
pub mod store;

pub use notify::SubscriptionTable;
pub use store::{FilePartyStore, InMemoryPartyStore};
