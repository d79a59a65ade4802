// src/journal/mod.rs

//! Live-status journal: one overwrite-in-place record per job kind.
//!
//! Every progress tick replaces the record with an IN_PROGRESS snapshot and
//! job completion replaces it with the certificate. There is no history.
//!
//! - [`file`] keeps each record as a JSON file, replaced atomically.
//! - [`memory`] keeps records in memory (tests, or hosts without a writable
//!   state directory).

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::JournalSection;
use crate::errors::{Result, WipeguardError};
use crate::job::Certificate;
use crate::types::{JobKind, JournalStorageMode};

pub mod file;
pub mod memory;

pub use file::FileJournal;
pub use memory::MemoryJournal;

/// Marker serialized as `"IN_PROGRESS"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InProgress {
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
}

/// Snapshot written on every progress tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveProgress {
    pub progress: i64,
    pub status: InProgress,
}

/// The single current record for a job kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JournalRecord {
    InProgress(LiveProgress),
    Finished(Certificate),
}

impl JournalRecord {
    pub fn in_progress(progress: i64) -> Self {
        JournalRecord::InProgress(LiveProgress {
            progress,
            status: InProgress::InProgress,
        })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JournalRecord::Finished(_))
    }
}

/// Storage for live-status records.
///
/// Only the orchestration path writes; anyone may read.
pub trait StatusJournal: Send + Sync + Debug {
    /// Replace the record for `kind`. Readers never see a partial write.
    fn write(&self, kind: JobKind, record: &JournalRecord) -> Result<()>;

    /// Latest record for `kind`, or `None` if nothing was ever written.
    fn read(&self, kind: JobKind) -> Result<Option<JournalRecord>>;
}

/// Build the journal selected by `[journal].storage`.
pub fn open_journal(section: &JournalSection) -> Result<Arc<dyn StatusJournal>> {
    match section.storage {
        JournalStorageMode::File => {
            info!(dir = %section.dir.display(), "using file journal");
            Ok(Arc::new(FileJournal::open(&section.dir)?))
        }
        JournalStorageMode::Memory => {
            info!("using in-memory journal");
            Ok(Arc::new(MemoryJournal::new()))
        }
    }
}

/// Run [`StatusJournal::write`] on the blocking pool so file IO never holds
/// a runtime worker.
pub async fn write_off_runtime(
    journal: &Arc<dyn StatusJournal>,
    kind: JobKind,
    record: JournalRecord,
) -> Result<()> {
    let journal = Arc::clone(journal);
    tokio::task::spawn_blocking(move || journal.write(kind, &record))
        .await
        .map_err(|e| WipeguardError::Other(anyhow::Error::from(e)))?
}

/// Run [`StatusJournal::read`] on the blocking pool.
pub async fn read_off_runtime(
    journal: &Arc<dyn StatusJournal>,
    kind: JobKind,
) -> Result<Option<JournalRecord>> {
    let journal = Arc::clone(journal);
    tokio::task::spawn_blocking(move || journal.read(kind))
        .await
        .map_err(|e| WipeguardError::Other(anyhow::Error::from(e)))?
}
