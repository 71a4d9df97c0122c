//! Builders to construct waitlist components from configuration.

pub mod waitlist_builder;

pub use waitlist_builder::{build_store, WaitlistBuilder};
