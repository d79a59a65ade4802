// src/config/model.rs

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::JournalStorageMode;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [server]
/// bind = "127.0.0.1:5000"
///
/// [journal]
/// storage = "file"
/// dir = "/var/lib/wipeguard"
///
/// [jobs]
/// elevate = ["sudo", "-S"]
///
/// [jobs.wipe]
/// program = "./wiper"
///
/// [jobs.factory_reset]
/// program = "./factoryreset"
/// confirm = "y"
/// ```
///
/// Every section is optional and has a default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub journal: JournalSection,

    #[serde(default)]
    pub jobs: JobsSection,

    #[serde(default)]
    pub disks: DisksSection,
}

/// Validated configuration. Build one with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigFile {
    pub server: ServerSection,
    pub journal: JournalSection,
    pub jobs: JobsSection,
    pub disks: DisksSection,

    #[serde(skip)]
    bind_addr: SocketAddr,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile, bind_addr: SocketAddr) -> Self {
        Self {
            server: raw.server,
            journal: raw.journal,
            jobs: raw.jobs,
            disks: raw.disks,
            bind_addr,
        }
    }

    /// Socket address parsed from `[server].bind`.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSection {
    /// Listen address. The `PORT` env var, when set, replaces the port.
    ///
    /// Loopback by default; set `0.0.0.0:5000` to accept remote callers.
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// `[journal]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JournalSection {
    #[serde(default)]
    pub storage: JournalStorageMode,

    /// Directory holding `wipe_live.json` and `factory_live.json`.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for JournalSection {
    fn default() -> Self {
        Self {
            storage: JournalStorageMode::default(),
            dir: default_dir(),
        }
    }
}

/// `[jobs]` section: how privileged processes are launched.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobsSection {
    /// Elevation prefix. The credential is written to the first stdin line,
    /// which is what `sudo -S` reads. An empty list runs the program directly.
    #[serde(default = "default_elevate")]
    pub elevate: Vec<String>,

    /// Working directory for the privileged processes.
    #[serde(default = "default_dir")]
    pub working_dir: PathBuf,

    /// Buffer an unterminated trailing stdout line until the next chunk
    /// arrives instead of parsing each chunk on its own.
    #[serde(default = "default_true")]
    pub reassemble_partial_lines: bool,

    /// Label a non-zero exit code as FAILED. Off by default: any clean exit
    /// produces a SUCCESS certificate.
    #[serde(default)]
    pub fail_on_nonzero_exit: bool,

    #[serde(default)]
    pub wipe: WipeJobSection,

    #[serde(default)]
    pub factory_reset: FactoryResetJobSection,
}

fn default_elevate() -> Vec<String> {
    vec!["sudo".to_string(), "-S".to_string()]
}

fn default_true() -> bool {
    true
}

impl Default for JobsSection {
    fn default() -> Self {
        Self {
            elevate: default_elevate(),
            working_dir: default_dir(),
            reassemble_partial_lines: true,
            fail_on_nonzero_exit: false,
            wipe: WipeJobSection::default(),
            factory_reset: FactoryResetJobSection::default(),
        }
    }
}

/// `[jobs.wipe]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WipeJobSection {
    #[serde(default = "default_wipe_program")]
    pub program: String,

    /// Prefix joined with the requested device name (`sdb` -> `/dev/sdb`).
    #[serde(default = "default_device_prefix")]
    pub device_prefix: String,
}

fn default_wipe_program() -> String {
    "./wiper".to_string()
}

fn default_device_prefix() -> String {
    "/dev/".to_string()
}

impl Default for WipeJobSection {
    fn default() -> Self {
        Self {
            program: default_wipe_program(),
            device_prefix: default_device_prefix(),
        }
    }
}

/// `[jobs.factory_reset]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FactoryResetJobSection {
    #[serde(default = "default_factory_program")]
    pub program: String,

    /// Confirmation line written after the credential.
    #[serde(default = "default_confirm")]
    pub confirm: String,
}

fn default_factory_program() -> String {
    "./factoryreset".to_string()
}

fn default_confirm() -> String {
    "y".to_string()
}

impl Default for FactoryResetJobSection {
    fn default() -> Self {
        Self {
            program: default_factory_program(),
            confirm: default_confirm(),
        }
    }
}

/// `[disks]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisksSection {
    /// Command whose stdout is `lsblk -J` shaped JSON.
    #[serde(default = "default_disks_command")]
    pub command: Vec<String>,
}

fn default_disks_command() -> Vec<String> {
    ["lsblk", "-o", "NAME,SIZE,TYPE,MOUNTPOINT", "-J"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for DisksSection {
    fn default() -> Self {
        Self {
            command: default_disks_command(),
        }
    }
}
