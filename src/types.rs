use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two privileged operations the service knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Wipe,
    FactoryReset,
}

impl JobKind {
    pub const ALL: [JobKind; 2] = [JobKind::Wipe, JobKind::FactoryReset];

    /// Label written into the certificate's `mode` field.
    pub fn mode_label(self) -> &'static str {
        match self {
            JobKind::Wipe => "Disk Wipe",
            JobKind::FactoryReset => "Factory Reset",
        }
    }

    /// File name of the live-status journal record for this kind.
    pub fn journal_file_name(self) -> &'static str {
        match self {
            JobKind::Wipe => "wipe_live.json",
            JobKind::FactoryReset => "factory_live.json",
        }
    }

    /// Acknowledgement returned by a successful submission.
    pub fn queued_message(self) -> &'static str {
        match self {
            JobKind::Wipe => "Wipe queued",
            JobKind::FactoryReset => "Factory reset queued",
        }
    }

    /// Plain-text body returned when progress is requested with nothing queued.
    pub fn idle_message(self) -> &'static str {
        match self {
            JobKind::Wipe => "No wipe running",
            JobKind::FactoryReset => "No factory reset running",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Wipe => f.write_str("wipe"),
            JobKind::FactoryReset => f.write_str("factory_reset"),
        }
    }
}

/// Overwrite strategy requested for a disk wipe.
///
/// Wire names match what the web UI sends: `zero`, `random`, `dod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WipeMethod {
    #[serde(rename = "zero")]
    ZeroFill,
    #[serde(rename = "random")]
    Random,
    #[serde(rename = "dod")]
    Dod522022M,
}

impl WipeMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            WipeMethod::ZeroFill => "zero",
            WipeMethod::Random => "random",
            WipeMethod::Dod522022M => "dod",
        }
    }

    /// Numeric method argument understood by the wiper executable.
    ///
    /// The wiper only implements zero-fill (`1`) and random overwrite (`2`);
    /// DoD requests run as zero-fill.
    pub fn wiper_arg(self) -> &'static str {
        match self {
            WipeMethod::Random => "2",
            WipeMethod::ZeroFill | WipeMethod::Dod522022M => "1",
        }
    }
}

impl fmt::Display for WipeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WipeMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zero" => Ok(WipeMethod::ZeroFill),
            "random" => Ok(WipeMethod::Random),
            "dod" => Ok(WipeMethod::Dod522022M),
            other => Err(format!(
                "Unknown wipe method: {other} (expected \"zero\", \"random\" or \"dod\")"
            )),
        }
    }
}

/// Where live-status records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalStorageMode {
    /// One JSON file per job kind under `[journal].dir`.
    File,
    /// In memory only (lost on restart).
    Memory,
}

impl Default for JournalStorageMode {
    fn default() -> Self {
        JournalStorageMode::File
    }
}
