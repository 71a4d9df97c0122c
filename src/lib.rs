//! # PrestoPosti
//!
//! A restaurant waitlist scheduling engine.
//!
//! Parties join a queue, are admitted into a fixed-capacity seating pool in
//! strict arrival order, and are released once their service time elapses.
//! Seat accounting is never cached: every decision that depends on occupancy
//! is recomputed from the store inside the same all-or-nothing transaction
//! that acts on it, so concurrent joins, ticks and check-ins (from one
//! process or many) can never seat more guests than there are seats.
//!
//! ## Lifecycle
//!
//! ```text
//! waiting --check_in (eligible)--> active --tick (service time elapsed)--> done
//! ```
//!
//! - **Admission**: [`core::Waitlist::join`] inserts a waiting party and
//!   returns an ETA of one service quantum per guest.
//! - **Eligibility**: waiting parties are walked earliest-join first and
//!   admitted while they fit the free seats; the walk stops at the first
//!   party that does not fit. [`core::AdmissionPolicy`] selects whether one
//!   evaluation admits a single party or as many as fit.
//! - **Tick**: [`core::Waitlist::tick`] releases every active party whose
//!   `party_size * quantum` has elapsed since check-in, verifies the number
//!   of released rows, then re-evaluates eligibility.
//! - **Check-in**: [`core::Waitlist::check_in`] re-validates eligibility
//!   inside its transaction; a party that is not eligible gets
//!   [`core::CheckInOutcome::Ineligible`] and nothing changes.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prestoposti::builders::WaitlistBuilder;
//! use prestoposti::config::WaitlistConfig;
//! use prestoposti::infra::notify::SubscriptionTable;
//! use prestoposti::runtime::{Ticker, TokioSpawner};
//!
//! let config = WaitlistConfig::from_env()?;
//! let subscriptions = Arc::new(SubscriptionTable::new());
//! let service = Arc::new(
//!     WaitlistBuilder::new(config.clone())
//!         .build_service(subscriptions.clone())
//!         .await?,
//! );
//!
//! let ticker = Ticker::new(service.clone(), config.tick_period()).start(&TokioSpawner::current());
//!
//! let admission = service.join("Rossi", 4).await?;
//! let mut events = subscriptions.subscribe(admission.id.clone());
//! // ... events.recv().await yields eligibility, then check-in / check-out ...
//!
//! ticker.shutdown();
//! service.waitlist().close().await?;
//! ```
//!
//! For complete scenarios, see `tests/waitlist_scenarios_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core waitlist abstractions and seat accounting.
pub mod core;
/// Configuration models for the waitlist and its backends.
pub mod config;
/// Builders to construct waitlist components from configuration.
pub mod builders;
/// Infrastructure adapters for stores and notifiers.
pub mod infra;
/// Runtime adapters: service facade, ticker and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
