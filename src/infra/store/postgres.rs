//! PostgreSQL-backed party store.
//!
//! Every transaction runs at `SERIALIZABLE` isolation, so concurrent
//! admission, tick and check-in operations from any number of processes
//! cannot both commit a decision based on the same occupancy. A serialization
//! failure surfaces as [`WaitlistError::Transaction`] and is the caller's to
//! retry.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use crate::core::{Party, PartyId, PartyState, PartyStore, QueueTransaction, WaitlistError};

const PARTY_COLUMNS: &str =
    "id, name, party_size, state, join_date, check_in_date, check_out_date";

const EXPIRED: &str = "state = 'active' \
     AND check_in_date + (party_size * $2::BIGINT) * INTERVAL '1 millisecond' <= $1";

fn db_error(e: sqlx::Error) -> WaitlistError {
    WaitlistError::Transaction(e.to_string())
}

#[derive(sqlx::FromRow)]
struct PartyRow {
    id: String,
    name: String,
    party_size: i32,
    state: String,
    join_date: DateTime<Utc>,
    check_in_date: Option<DateTime<Utc>>,
    check_out_date: Option<DateTime<Utc>>,
}

impl TryFrom<PartyRow> for Party {
    type Error = WaitlistError;

    fn try_from(row: PartyRow) -> Result<Self, Self::Error> {
        let state = PartyState::parse(&row.state).ok_or_else(|| {
            WaitlistError::Transaction(format!("unknown party state `{}`", row.state))
        })?;
        let party_size = u32::try_from(row.party_size).map_err(|_| {
            WaitlistError::Transaction(format!("negative party size {}", row.party_size))
        })?;
        Ok(Self {
            id: PartyId::from(row.id),
            name: row.name,
            party_size,
            state,
            join_date: row.join_date,
            check_in_date: row.check_in_date,
            check_out_date: row.check_out_date,
        })
    }
}

fn into_parties(rows: Vec<PartyRow>) -> Result<Vec<Party>, WaitlistError> {
    rows.into_iter().map(Party::try_from).collect()
}

fn quantum_ms(quantum: Duration) -> i64 {
    quantum.num_milliseconds()
}

/// Store backed by a `waitlist_parties` table.
#[derive(Clone)]
pub struct PostgresPartyStore {
    pool: PgPool,
}

impl PostgresPartyStore {
    /// Connect to `database_url` with at most `max_connections` connections.
    ///
    /// # Errors
    ///
    /// `Transaction` if the pool cannot be established.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, WaitlistError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(db_error)?;
        tracing::info!(max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Migration statements for the party table.
    #[must_use]
    pub fn migrations() -> &'static [&'static str] {
        &[
            r"
CREATE TABLE IF NOT EXISTS waitlist_parties (
    seq BIGSERIAL UNIQUE,
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(name) > 0),
    party_size INT NOT NULL CHECK (party_size > 0),
    state TEXT NOT NULL CHECK (state IN ('waiting', 'active', 'done')),
    join_date TIMESTAMPTZ NOT NULL,
    check_in_date TIMESTAMPTZ,
    check_out_date TIMESTAMPTZ
)",
            "CREATE INDEX IF NOT EXISTS idx_waitlist_parties_state_join
    ON waitlist_parties (state, join_date, seq)",
        ]
    }

    /// Apply [`PostgresPartyStore::migrations`].
    ///
    /// # Errors
    ///
    /// `Transaction` if any statement fails.
    pub async fn migrate(&self) -> Result<(), WaitlistError> {
        for statement in Self::migrations() {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl PartyStore for PostgresPartyStore {
    async fn begin(&self) -> Result<Box<dyn QueueTransaction>, WaitlistError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        Ok(Box::new(PostgresTransaction { tx }))
    }

    async fn get(&self, id: &PartyId) -> Result<Option<Party>, WaitlistError> {
        let row: Option<PartyRow> = sqlx::query_as(&format!(
            "SELECT {PARTY_COLUMNS} FROM waitlist_parties WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.map(Party::try_from).transpose()
    }

    async fn list(&self, state: Option<PartyState>) -> Result<Vec<Party>, WaitlistError> {
        let rows: Vec<PartyRow> = sqlx::query_as(&format!(
            "SELECT {PARTY_COLUMNS} FROM waitlist_parties \
             WHERE $1::TEXT IS NULL OR state = $1 ORDER BY join_date, seq"
        ))
        .bind(state.map(PartyState::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        into_parties(rows)
    }

    async fn clear(&self) -> Result<(), WaitlistError> {
        sqlx::query("DELETE FROM waitlist_parties")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn close(&self) -> Result<(), WaitlistError> {
        self.pool.close().await;
        tracing::info!("closed postgres pool");
        Ok(())
    }
}

/// Serializable transaction on a [`PostgresPartyStore`].
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl QueueTransaction for PostgresTransaction {
    async fn insert(&mut self, party: Party) -> Result<(), WaitlistError> {
        let party_size = i32::try_from(party.party_size)
            .map_err(|_| WaitlistError::Validation("party size out of range".into()))?;
        sqlx::query(
            "INSERT INTO waitlist_parties \
             (id, name, party_size, state, join_date, check_in_date, check_out_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(party.id.as_str())
        .bind(&party.name)
        .bind(party_size)
        .bind(party.state.as_str())
        .bind(party.join_date)
        .bind(party.check_in_date)
        .bind(party.check_out_date)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn get(&mut self, id: &PartyId) -> Result<Option<Party>, WaitlistError> {
        let row: Option<PartyRow> = sqlx::query_as(&format!(
            "SELECT {PARTY_COLUMNS} FROM waitlist_parties WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error)?;
        row.map(Party::try_from).transpose()
    }

    async fn occupancy(&mut self) -> Result<u32, WaitlistError> {
        let occupied: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(party_size), 0)::BIGINT FROM waitlist_parties
             WHERE state = 'active'",
        )
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error)?;
        u32::try_from(occupied)
            .map_err(|_| WaitlistError::Transaction(format!("occupancy {occupied} out of range")))
    }

    async fn waiting_within(&mut self, max_size: u32) -> Result<Vec<Party>, WaitlistError> {
        let rows: Vec<PartyRow> = sqlx::query_as(&format!(
            "SELECT {PARTY_COLUMNS} FROM waitlist_parties \
             WHERE state = 'waiting' AND party_size <= $1 ORDER BY join_date, seq"
        ))
        .bind(i32::try_from(max_size).unwrap_or(i32::MAX))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error)?;
        into_parties(rows)
    }

    async fn find_expired(
        &mut self,
        now: DateTime<Utc>,
        quantum: Duration,
    ) -> Result<Vec<Party>, WaitlistError> {
        let rows: Vec<PartyRow> = sqlx::query_as(&format!(
            "SELECT {PARTY_COLUMNS} FROM waitlist_parties WHERE {EXPIRED} ORDER BY join_date, seq"
        ))
        .bind(now)
        .bind(quantum_ms(quantum))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error)?;
        into_parties(rows)
    }

    async fn check_out_expired(
        &mut self,
        now: DateTime<Utc>,
        quantum: Duration,
    ) -> Result<u64, WaitlistError> {
        let result = sqlx::query(&format!(
            "UPDATE waitlist_parties SET state = 'done', check_out_date = $1 WHERE {EXPIRED}"
        ))
        .bind(now)
        .bind(quantum_ms(quantum))
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected())
    }

    async fn check_in(&mut self, id: &PartyId, now: DateTime<Utc>) -> Result<u64, WaitlistError> {
        let result = sqlx::query(
            "UPDATE waitlist_parties SET state = 'active', check_in_date = $2 \
             WHERE id = $1 AND state = 'waiting'",
        )
        .bind(id.as_str())
        .bind(now)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), WaitlistError> {
        self.tx.commit().await.map_err(db_error)
    }

    async fn rollback(self: Box<Self>) -> Result<(), WaitlistError> {
        self.tx.rollback().await.map_err(db_error)
    }
}
