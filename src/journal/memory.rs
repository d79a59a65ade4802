// src/journal/memory.rs

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{JournalRecord, StatusJournal};
use crate::errors::Result;
use crate::types::JobKind;

/// In-memory journal. Records are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    records: Mutex<HashMap<JobKind, JournalRecord>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusJournal for MemoryJournal {
    fn write(&self, kind: JobKind, record: &JournalRecord) -> Result<()> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.insert(kind, record.clone());
        Ok(())
    }

    fn read(&self, kind: JobKind) -> Result<Option<JournalRecord>> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(&kind).cloned())
    }
}
