//! Periodic tick scheduler.
//!
//! One logical timer drives [`WaitlistService::try_tick`]. Missed periods are
//! skipped rather than burst, and a period that fires while the previous tick
//! is still running is dropped. Failed ticks are logged and retried on the
//! next period.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::runtime::{Spawn, WaitlistService};

/// Stops a running [`Ticker`].
pub struct TickerHandle {
    shutdown: watch::Sender<bool>,
}

impl TickerHandle {
    /// Ask the ticker to stop after its current tick.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Whether the ticker loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.shutdown.is_closed()
    }
}

/// Drives ticks on a fixed period.
pub struct Ticker {
    service: Arc<WaitlistService>,
    period: Duration,
}

impl Ticker {
    /// Tick `service` every `period`.
    #[must_use]
    pub const fn new(service: Arc<WaitlistService>, period: Duration) -> Self {
        Self { service, period }
    }

    /// Spawn the loop on `spawner`. The first tick fires one period from now.
    pub fn start<S: Spawn>(self, spawner: &S) -> TickerHandle {
        let (tx, rx) = watch::channel(false);
        spawner.spawn(Self::run(self.service, self.period, rx));
        TickerHandle { shutdown: tx }
    }

    async fn run(
        service: Arc<WaitlistService>,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(period = ?period, "ticker started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match service.try_tick(None).await {
                        None | Some(Ok(_)) => {}
                        Some(Err(e)) if e.is_alert() => {
                            tracing::error!(error = %e, "tick integrity violation");
                        }
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "tick failed, retrying next period");
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("ticker stopped");
    }
}
