// src/journal/file.rs

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{JournalRecord, StatusJournal};
use crate::errors::Result;
use crate::types::JobKind;

/// JSON-file journal: `<dir>/wipe_live.json` and `<dir>/factory_live.json`.
#[derive(Debug, Clone)]
pub struct FileJournal {
    dir: PathBuf,
}

impl FileJournal {
    /// Use `dir` for records, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, kind: JobKind) -> PathBuf {
        self.dir.join(kind.journal_file_name())
    }

    fn tmp_path_for(&self, kind: JobKind) -> PathBuf {
        self.dir.join(format!(".{}.tmp", kind.journal_file_name()))
    }
}

impl StatusJournal for FileJournal {
    fn write(&self, kind: JobKind, record: &JournalRecord) -> Result<()> {
        let path = self.path_for(kind);
        let tmp_path = self.tmp_path_for(kind);

        let body = serde_json::to_vec_pretty(record)?;
        let mut file = File::create(&tmp_path)?;
        file.write_all(&body)?;
        file.sync_all()?;
        fs::rename(&tmp_path, &path)?;

        debug!(%kind, path = %path.display(), "journal record replaced");
        Ok(())
    }

    fn read(&self, kind: JobKind) -> Result<Option<JournalRecord>> {
        match fs::read(self.path_for(kind)) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
