//! Configuration models for the waitlist, its store and its ticker.

pub mod waitlist;

pub use waitlist::{StoreBackendConfig, WaitlistConfig, MAX_PERIOD_MS};
