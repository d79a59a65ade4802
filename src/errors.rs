// src/errors.rs

//! Crate-wide error types.
//!
//! - [`WipeguardError`] covers startup and IO concerns (config, journal,
//!   serialization).
//! - [`JobError`] is the job-level taxonomy that request handlers translate
//!   into HTTP responses or terminal stream frames.

use thiserror::Error;

use crate::types::JobKind;

#[derive(Error, Debug)]
pub enum WipeguardError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures of a single privileged job.
///
/// Messages never include the credential.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("a {0} job is already queued or running")]
    Conflict(JobKind),

    #[error("no {0} job is queued")]
    NoActiveJob(JobKind),

    #[error("a subscriber is already attached to the {0} job")]
    AlreadyAttached(JobKind),

    #[error("failed to launch privileged process: {0}")]
    LaunchFailure(String),

    #[error("failed to finalize job: {0}")]
    FinalizationFailure(String),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WipeguardError>;
