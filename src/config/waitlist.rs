//! Waitlist configuration structures.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::{AdmissionPolicy, WaitlistLimits, SEAT_CAPACITY, SERVICE_TIME_PER_PERSON_MS};
use crate::util::clock::millis;

/// Store backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreBackendConfig {
    /// In-memory store for development/testing.
    InMemory,
    /// JSON-lines journal under a directory.
    File {
        /// Directory holding the journal.
        path: PathBuf,
        /// Journal file stem.
        #[serde(default = "default_stream")]
        stream: String,
    },
    /// PostgreSQL database.
    Postgres {
        /// Connection string.
        url: String,
        /// Pool size.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
}

fn default_stream() -> String {
    "queue".into()
}

/// Upper bound for the service quantum and the tick period: one day.
pub const MAX_PERIOD_MS: u64 = 86_400_000;

const fn default_max_connections() -> u32 {
    5
}

const fn default_seat_capacity() -> u32 {
    SEAT_CAPACITY
}

const fn default_service_time_ms() -> u64 {
    SERVICE_TIME_PER_PERSON_MS
}

const fn default_store() -> StoreBackendConfig {
    StoreBackendConfig::InMemory
}

/// Root waitlist configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistConfig {
    /// Seats available at once.
    #[serde(default = "default_seat_capacity")]
    pub seat_capacity: u32,
    /// Service quantum per person in milliseconds.
    #[serde(default = "default_service_time_ms")]
    pub service_time_ms: u64,
    /// Admission policy for each eligibility evaluation.
    #[serde(default)]
    pub admission: AdmissionPolicy,
    /// Tick period in milliseconds; defaults to the service quantum.
    #[serde(default)]
    pub tick_period_ms: Option<u64>,
    /// Store backend.
    #[serde(default = "default_store")]
    pub store: StoreBackendConfig,
}

impl Default for WaitlistConfig {
    fn default() -> Self {
        Self {
            seat_capacity: SEAT_CAPACITY,
            service_time_ms: SERVICE_TIME_PER_PERSON_MS,
            admission: AdmissionPolicy::default(),
            tick_period_ms: None,
            store: StoreBackendConfig::InMemory,
        }
    }
}

impl WaitlistConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Describes the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.seat_capacity == 0 {
            return Err("seat_capacity must be greater than 0".into());
        }
        if !(1..=MAX_PERIOD_MS).contains(&self.service_time_ms) {
            return Err(format!("service_time_ms must be in 1..={MAX_PERIOD_MS}"));
        }
        if self
            .tick_period_ms
            .is_some_and(|ms| !(1..=MAX_PERIOD_MS).contains(&ms))
        {
            return Err(format!("tick_period_ms must be in 1..={MAX_PERIOD_MS}"));
        }
        match &self.store {
            StoreBackendConfig::InMemory => {}
            StoreBackendConfig::File { path, stream } => {
                if path.as_os_str().is_empty() {
                    return Err("file store path must not be empty".into());
                }
                if stream.trim().is_empty() {
                    return Err("file store stream must not be empty".into());
                }
            }
            StoreBackendConfig::Postgres {
                url,
                max_connections,
            } => {
                if url.trim().is_empty() {
                    return Err("postgres url must not be empty".into());
                }
                if *max_connections == 0 {
                    return Err("postgres max_connections must be greater than 0".into());
                }
            }
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the environment, loading `.env` first.
    ///
    /// Reads `WAITLIST_SEAT_CAPACITY`, `WAITLIST_SERVICE_TIME_MS`,
    /// `WAITLIST_ADMISSION`, `WAITLIST_TICK_PERIOD_MS`, `WAITLIST_STORE`
    /// (`in_memory`, `file` or `postgres`), `WAITLIST_DATA_DIR` and
    /// `DATABASE_URL`. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Malformed values or a configuration that fails validation.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Malformed values or a configuration that fails validation.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        fn number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, String> {
            raw.trim()
                .parse()
                .map_err(|_| format!("{key} must be a positive integer, got `{raw}`"))
        }

        let mut cfg = Self::default();
        if let Some(raw) = lookup("WAITLIST_SEAT_CAPACITY") {
            cfg.seat_capacity = number("WAITLIST_SEAT_CAPACITY", &raw)?;
        }
        if let Some(raw) = lookup("WAITLIST_SERVICE_TIME_MS") {
            cfg.service_time_ms = number("WAITLIST_SERVICE_TIME_MS", &raw)?;
        }
        if let Some(raw) = lookup("WAITLIST_TICK_PERIOD_MS") {
            cfg.tick_period_ms = Some(number("WAITLIST_TICK_PERIOD_MS", &raw)?);
        }
        if let Some(raw) = lookup("WAITLIST_ADMISSION") {
            cfg.admission = AdmissionPolicy::parse(&raw).ok_or_else(|| {
                format!("WAITLIST_ADMISSION must be single or greedy, got `{raw}`")
            })?;
        }
        match lookup("WAITLIST_STORE").as_deref().map(str::trim) {
            None | Some("in_memory") => {}
            Some("file") => {
                let path = lookup("WAITLIST_DATA_DIR")
                    .ok_or("WAITLIST_DATA_DIR is required for the file store")?;
                cfg.store = StoreBackendConfig::File {
                    path: PathBuf::from(path),
                    stream: default_stream(),
                };
            }
            Some("postgres") => {
                let url = lookup("DATABASE_URL")
                    .ok_or("DATABASE_URL is required for the postgres store")?;
                cfg.store = StoreBackendConfig::Postgres {
                    url,
                    max_connections: default_max_connections(),
                };
            }
            Some(other) => return Err(format!("unknown WAITLIST_STORE `{other}`")),
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Engine limits derived from this configuration.
    #[must_use]
    pub fn limits(&self) -> WaitlistLimits {
        WaitlistLimits {
            seat_capacity: self.seat_capacity,
            service_time: millis(self.service_time_ms),
            admission: self.admission,
        }
    }

    /// Tick period, falling back to the service quantum.
    #[must_use]
    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_period_ms.unwrap_or(self.service_time_ms))
    }
}
