use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

use wipeguard::errors::{Result, WipeguardError};
use wipeguard::journal::{JournalRecord, MemoryJournal, StatusJournal};
use wipeguard::types::JobKind;

/// Which writes a [`FailingJournal`] rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    /// Only certificate writes; progress ticks succeed.
    Finished,
    All,
}

/// Journal that refuses some writes and keeps the accepted ones in memory.
#[derive(Debug)]
pub struct FailingJournal {
    inner: MemoryJournal,
    fail_on: FailOn,
    rejected: AtomicUsize,
}

impl FailingJournal {
    pub fn new(fail_on: FailOn) -> Self {
        Self {
            inner: MemoryJournal::new(),
            fail_on,
            rejected: AtomicUsize::new(0),
        }
    }

    /// Number of writes refused so far.
    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }
}

impl StatusJournal for FailingJournal {
    fn write(&self, kind: JobKind, record: &JournalRecord) -> Result<()> {
        let refuse = match self.fail_on {
            FailOn::All => true,
            FailOn::Finished => record.is_terminal(),
        };
        if refuse {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(WipeguardError::IoError(io::Error::other("no space left on device")));
        }
        self.inner.write(kind, record)
    }

    fn read(&self, kind: JobKind) -> Result<Option<JournalRecord>> {
        self.inner.read(kind)
    }
}
