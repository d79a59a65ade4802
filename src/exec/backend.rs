// src/exec/backend.rs

//! Pluggable process runner abstraction.
//!
//! The orchestrator talks to a `ProcessRunner` instead of `tokio::process`
//! directly, so tests can script output and exit codes without elevation.
//!
//! - [`CommandRunner`](super::CommandRunner) is the production runner.
//! - The test-utils crate provides a scripted runner that replays chunks.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::errors::JobError;
use crate::job::Credential;

use super::launch::LaunchSpec;

/// Output of a launched process, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerEvent {
    /// A raw stdout chunk. Chunk boundaries are arbitrary.
    Stdout(String),
    /// The process exited. Always the last event; `code` is `None` when the
    /// process was killed by a signal.
    Exited { code: Option<i32> },
}

/// Receiving side of a launched process. Not restartable.
#[derive(Debug)]
pub struct RunHandle {
    events: mpsc::Receiver<RunnerEvent>,
}

impl RunHandle {
    pub fn new(events: mpsc::Receiver<RunnerEvent>) -> Self {
        Self { events }
    }

    /// Next event, or `None` once the runner has gone away.
    pub async fn next_event(&mut self) -> Option<RunnerEvent> {
        self.events.recv().await
    }
}

/// Trait abstracting how privileged processes are started.
pub trait ProcessRunner: Send + Sync {
    /// Start the process described by `spec` and feed it `credential`.
    ///
    /// Fails with [`JobError::LaunchFailure`] before anything is written to
    /// the process if it cannot be started. On success the credential has
    /// been written and dropped by the time the returned handle yields events.
    fn launch(
        &self,
        spec: LaunchSpec,
        credential: Credential,
    ) -> Pin<Box<dyn Future<Output = Result<RunHandle, JobError>> + Send + '_>>;
}
