use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::time::Duration;

use wipeguard::errors::Result;
use wipeguard::journal::{JournalRecord, MemoryJournal, StatusJournal};
use wipeguard::types::JobKind;

const GATE_TIMEOUT: Duration = Duration::from_secs(2);

/// Journal whose progress writes block the calling thread until the test
/// opens the gate (or two seconds pass). Certificate writes go straight
/// through.
#[derive(Debug)]
pub struct GatedJournal {
    inner: MemoryJournal,
    permits: Mutex<Receiver<()>>,
    opener: Mutex<Sender<()>>,
    timed_out: AtomicBool,
}

impl GatedJournal {
    pub fn new() -> Self {
        let (opener, permits) = mpsc::channel();
        Self {
            inner: MemoryJournal::new(),
            permits: Mutex::new(permits),
            opener: Mutex::new(opener),
            timed_out: AtomicBool::new(false),
        }
    }

    /// Let one parked (or future) progress write through.
    pub fn open(&self) {
        let _ = self.opener.lock().unwrap().send(());
    }

    /// Whether any write gave up waiting for the gate.
    pub fn timed_out(&self) -> bool {
        self.timed_out.load(Ordering::SeqCst)
    }
}

impl Default for GatedJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusJournal for GatedJournal {
    fn write(&self, kind: JobKind, record: &JournalRecord) -> Result<()> {
        if !record.is_terminal() {
            let permits = self.permits.lock().unwrap();
            if permits.recv_timeout(GATE_TIMEOUT).is_err() {
                self.timed_out.store(true, Ordering::SeqCst);
            }
        }
        self.inner.write(kind, record)
    }

    fn read(&self, kind: JobKind) -> Result<Option<JournalRecord>> {
        self.inner.read(kind)
    }
}
