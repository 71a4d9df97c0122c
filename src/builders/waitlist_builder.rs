//! Builders to construct stores and waitlists from configuration.

use std::sync::Arc;

use anyhow::Context;

use crate::config::{StoreBackendConfig, WaitlistConfig};
use crate::core::{AppResult, Notifier, PartyStore, Waitlist, WaitlistError};
use crate::infra::store::{FilePartyStore, InMemoryPartyStore};
use crate::runtime::WaitlistService;
use crate::util::clock::Clock;

/// Open the store selected by `cfg`.
///
/// # Errors
///
/// `Transaction` if the backend cannot be opened, `Validation` if the
/// backend is not compiled in.
pub async fn build_store(cfg: &StoreBackendConfig) -> Result<Arc<dyn PartyStore>, WaitlistError> {
    match cfg {
        StoreBackendConfig::InMemory => Ok(Arc::new(InMemoryPartyStore::new())),
        StoreBackendConfig::File { path, stream } => {
            Ok(Arc::new(FilePartyStore::open(path, stream.clone())?))
        }
        #[cfg(feature = "postgres")]
        StoreBackendConfig::Postgres {
            url,
            max_connections,
        } => {
            let store =
                crate::infra::store::PostgresPartyStore::connect(url, *max_connections).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        StoreBackendConfig::Postgres { .. } => Err(WaitlistError::Validation(
            "postgres store requires the `postgres` feature".into(),
        )),
    }
}

/// Builder for a [`Waitlist`] and its service facade.
pub struct WaitlistBuilder {
    config: WaitlistConfig,
    clock: Option<Arc<dyn Clock>>,
    store: Option<Arc<dyn PartyStore>>,
}

impl WaitlistBuilder {
    /// Start from `config`.
    #[must_use]
    pub const fn new(config: WaitlistConfig) -> Self {
        Self {
            config,
            clock: None,
            store: None,
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &WaitlistConfig {
        &self.config
    }

    /// Use `clock` instead of the wall clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use an already opened store instead of the configured backend.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn PartyStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Validate the configuration, open the store and build the engine.
    ///
    /// # Errors
    ///
    /// Invalid configuration or a store that cannot be opened.
    pub async fn build(self) -> AppResult<Waitlist> {
        self.config
            .validate()
            .map_err(|e| anyhow::anyhow!("config invalid: {e}"))?;
        let store = match self.store {
            Some(store) => store,
            None => build_store(&self.config.store)
                .await
                .context("opening party store")?,
        };
        let waitlist = Waitlist::new(self.config.limits(), store);
        Ok(match self.clock {
            Some(clock) => waitlist.with_clock(clock),
            None => waitlist,
        })
    }

    /// Build the engine wrapped in a service that fans out to `notifier`.
    ///
    /// # Errors
    ///
    /// See [`WaitlistBuilder::build`].
    pub async fn build_service(self, notifier: Arc<dyn Notifier>) -> AppResult<WaitlistService> {
        let waitlist = self.build().await?;
        Ok(WaitlistService::new(Arc::new(waitlist), notifier))
    }
}
