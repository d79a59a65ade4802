// src/orchestrator/mod.rs

//! Single-flight privileged job orchestration.
//!
//! - [`slots`] is the Job Slot Manager: admission control per job kind.
//! - [`broadcaster`] runs an attached job and pushes its frames.
//!
//! A job is submitted first (slot reserved, nothing launched), then started
//! by the first subscriber that attaches. The job runs on its own Tokio task,
//! detached from the subscriber, and clears its slot just before the terminal
//! frame is sent.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::JobsSection;
use crate::errors::{JobError, Result};
use crate::exec::{LaunchSpec, ProcessRunner};
use crate::job::{Certificate, JobRequest};
use crate::journal::{read_off_runtime, JournalRecord, StatusJournal};
use crate::types::JobKind;

mod broadcaster;
pub mod slots;

use broadcaster::{Broadcaster, FrameSink};
pub use slots::{JobSlots, SlotView};

/// Push frames sent to a progress subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Percentage exactly as reported by the process.
    Progress(i64),
    /// Terminal certificate. Always the last frame of a job.
    Done(Certificate),
    /// Stream-level rejection; no job frames follow.
    Error(String),
}

impl Frame {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Frame::Progress(_))
    }
}

/// Receiving end of a progress subscription. Closes after the last frame.
pub type FrameReceiver = mpsc::Receiver<Frame>;

const FRAME_CHANNEL_CAPACITY: usize = 64;

pub struct Orchestrator {
    slots: Arc<JobSlots>,
    journal: Arc<dyn StatusJournal>,
    runner: Arc<dyn ProcessRunner>,
    jobs: JobsSection,
}

impl Orchestrator {
    pub fn new(
        jobs: JobsSection,
        journal: Arc<dyn StatusJournal>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            slots: Arc::new(JobSlots::new()),
            journal,
            runner,
            jobs,
        }
    }

    /// Queue a job. Returns the acknowledgement message.
    pub fn submit(&self, request: JobRequest) -> std::result::Result<&'static str, JobError> {
        let kind = request.kind;
        let device = request.target.clone();
        let method = request.method;

        match self.slots.submit(request) {
            Ok(()) => {
                info!(%kind, device = ?device, method = ?method, "job queued");
                Ok(kind.queued_message())
            }
            Err(err) => {
                warn!(%kind, error = %err, "job rejected");
                Err(err)
            }
        }
    }

    /// Start the queued job of `kind` and subscribe to its frames.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn attach(&self, kind: JobKind) -> std::result::Result<FrameReceiver, JobError> {
        let request = self.slots.attach(kind)?;
        let (summary, credential) = request.into_parts();
        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);

        let spec = LaunchSpec::for_job(&self.jobs, &summary);
        let broadcaster = Broadcaster::new(
            summary,
            Arc::clone(&self.journal),
            Arc::clone(&self.slots),
            FrameSink::new(tx),
            self.jobs.reassemble_partial_lines,
            self.jobs.fail_on_nonzero_exit,
        );
        let runner = Arc::clone(&self.runner);

        info!(%kind, "subscriber attached; launching job");
        tokio::spawn(async move {
            let launched = match credential {
                Some(credential) => runner.launch(spec, credential).await,
                None => Err(JobError::LaunchFailure("no credential supplied".to_string())),
            };
            match launched {
                Ok(handle) => {
                    broadcaster.stream(handle).await;
                }
                Err(err) => {
                    broadcaster.launch_failed(&err).await;
                }
            }
        });

        Ok(rx)
    }

    /// Latest journaled state for `kind`.
    pub async fn status(&self, kind: JobKind) -> Result<Option<JournalRecord>> {
        read_off_runtime(&self.journal, kind).await
    }

    pub fn slot_state(&self, kind: JobKind) -> SlotView {
        self.slots.state(kind)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("slots", &self.slots)
            .field("journal", &self.journal)
            .finish_non_exhaustive()
    }
}
