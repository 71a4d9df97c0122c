//! File-backed party store.
//!
//! Keeps the table in memory and persists it as JSON lines, one party per
//! line. Every commit rewrites the journal through a temporary file and a
//! rename, so a crash leaves either the old or the new table on disk. A
//! failed write aborts the commit.

use std::fs::{create_dir_all, rename, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::core::{Party, PartyId, PartyState, PartyStore, QueueTransaction, WaitlistError};
use crate::infra::store::memory::{InMemoryPartyStore, PartyTable};

fn io_error(e: impl std::fmt::Display) -> WaitlistError {
    WaitlistError::Transaction(e.to_string())
}

/// JSON-lines snapshot of a party table.
#[derive(Debug)]
pub(crate) struct Journal {
    path: PathBuf,
    stream: String,
}

impl Journal {
    fn file_path(&self) -> PathBuf {
        self.path.join(format!("{}.jsonl", self.stream))
    }

    fn load(&self) -> Result<PartyTable, WaitlistError> {
        let file_path = self.file_path();
        if !file_path.exists() {
            return Ok(PartyTable::default());
        }
        let file = OpenOptions::new()
            .read(true)
            .open(&file_path)
            .map_err(io_error)?;
        let mut parties = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(io_error)?;
            if line.trim().is_empty() {
                continue;
            }
            let party: Party = serde_json::from_str(&line).map_err(io_error)?;
            parties.push(party);
        }
        Ok(PartyTable::from_parties(parties))
    }

    pub(crate) fn rewrite(&self, table: &PartyTable) -> Result<(), WaitlistError> {
        let file_path = self.file_path();
        let tmp_path = file_path.with_extension("jsonl.tmp");
        {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .map_err(io_error)?;
            let mut writer = BufWriter::new(file);
            for party in table.parties() {
                let line = serde_json::to_string(party).map_err(io_error)?;
                writeln!(writer, "{line}").map_err(io_error)?;
            }
            writer.flush().map_err(io_error)?;
            writer.get_ref().sync_all().map_err(io_error)?;
        }
        rename(&tmp_path, &file_path).map_err(io_error)
    }
}

/// Durable store persisted under a directory as `<stream>.jsonl`.
#[derive(Clone)]
pub struct FilePartyStore {
    inner: InMemoryPartyStore,
    location: PathBuf,
}

impl FilePartyStore {
    /// Open (or create) the store, loading any existing journal.
    ///
    /// # Errors
    ///
    /// `Transaction` if the directory cannot be created or the journal is
    /// unreadable.
    pub fn open(path: impl AsRef<Path>, stream: impl Into<String>) -> Result<Self, WaitlistError> {
        let path = path.as_ref().to_path_buf();
        create_dir_all(&path).map_err(io_error)?;
        let journal = Journal {
            path,
            stream: stream.into(),
        };
        let location = journal.file_path();
        let table = journal.load()?;
        tracing::info!(
            path = %location.display(),
            parties = table.parties().len(),
            "opened file store"
        );
        Ok(Self {
            inner: InMemoryPartyStore::with_journal(table, journal),
            location,
        })
    }

    /// Journal file backing this store.
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }
}

#[async_trait]
impl PartyStore for FilePartyStore {
    async fn begin(&self) -> Result<Box<dyn QueueTransaction>, WaitlistError> {
        self.inner.begin().await
    }

    async fn get(&self, id: &PartyId) -> Result<Option<Party>, WaitlistError> {
        self.inner.get(id).await
    }

    async fn list(&self, state: Option<PartyState>) -> Result<Vec<Party>, WaitlistError> {
        self.inner.list(state).await
    }

    async fn clear(&self) -> Result<(), WaitlistError> {
        self.inner.clear().await
    }

    async fn close(&self) -> Result<(), WaitlistError> {
        self.inner.close().await?;
        tracing::info!(path = %self.location.display(), "closed file store");
        Ok(())
    }
}
