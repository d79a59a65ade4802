// src/orchestrator/broadcaster.rs

//! Drives one attached job from launch to certificate.
//!
//! Runner output is decoded into progress ticks. Each tick is journaled and
//! pushed to the subscriber. At exit the certificate is journaled and sent as
//! the last frame. Losing the subscriber never stops the job.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use crate::errors::JobError;
use crate::exec::{RunHandle, RunnerEvent};
use crate::job::{Certificate, CertificateStatus, JobSummary};
use crate::journal::{write_off_runtime, JournalRecord, StatusJournal};
use crate::progress::{parse_chunk, LineAssembler, ProgressEvent};

use super::slots::JobSlots;
use super::Frame;

/// Subscriber side of the push channel.
///
/// Progress frames never wait for the subscriber: when the channel is full
/// they are dropped, so a stalled reader cannot stall the process. Terminal
/// frames are awaited. Sends after a disconnect are dropped.
#[derive(Debug)]
pub(crate) struct FrameSink {
    tx: mpsc::Sender<Frame>,
    connected: bool,
}

impl FrameSink {
    pub(crate) fn new(tx: mpsc::Sender<Frame>) -> Self {
        Self {
            tx,
            connected: true,
        }
    }

    pub(crate) fn push_progress(&mut self, percent: i64) {
        if !self.connected {
            return;
        }
        match self.tx.try_send(Frame::Progress(percent)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!(percent, "subscriber is behind; progress frame dropped");
            }
            Err(TrySendError::Closed(_)) => self.disconnected(),
        }
    }

    pub(crate) async fn send_terminal(&mut self, frame: Frame) {
        if !self.connected {
            return;
        }
        if self.tx.send(frame).await.is_err() {
            self.disconnected();
        }
    }

    fn disconnected(&mut self) {
        info!("subscriber disconnected; job continues");
        self.connected = false;
    }
}

/// Output decoding strategy for stdout chunks.
#[derive(Debug)]
enum Decoder {
    PerChunk,
    Buffered(LineAssembler),
}

impl Decoder {
    fn push(&mut self, chunk: &str) -> Vec<ProgressEvent> {
        match self {
            Decoder::PerChunk => parse_chunk(chunk),
            Decoder::Buffered(asm) => asm.push(chunk),
        }
    }

    fn finish(&mut self) -> Vec<ProgressEvent> {
        match self {
            Decoder::PerChunk => Vec::new(),
            Decoder::Buffered(asm) => asm.finish(),
        }
    }
}

/// Per-job broadcaster state.
pub(crate) struct Broadcaster {
    summary: JobSummary,
    journal: Arc<dyn StatusJournal>,
    slots: Arc<JobSlots>,
    sink: FrameSink,
    decoder: Decoder,
    fail_on_nonzero_exit: bool,
}

impl Broadcaster {
    pub(crate) fn new(
        summary: JobSummary,
        journal: Arc<dyn StatusJournal>,
        slots: Arc<JobSlots>,
        sink: FrameSink,
        reassemble_partial_lines: bool,
        fail_on_nonzero_exit: bool,
    ) -> Self {
        let decoder = if reassemble_partial_lines {
            Decoder::Buffered(LineAssembler::new())
        } else {
            Decoder::PerChunk
        };
        Self {
            summary,
            journal,
            slots,
            sink,
            decoder,
            fail_on_nonzero_exit,
        }
    }

    /// Report a job that never started: FAILED certificate, no progress.
    pub(crate) async fn launch_failed(mut self, err: &JobError) -> Certificate {
        let kind = self.summary.kind;
        error!(%kind, error = %err, "privileged process could not be launched");

        let cert = Certificate::issue(&self.summary, CertificateStatus::Failed);
        if let Err(e) = self.journal_write(JournalRecord::Finished(cert.clone())).await {
            warn!(%kind, error = %e, "failed to journal launch failure");
        }
        self.release_slot();
        self.sink.send_terminal(Frame::Done(cert.clone())).await;
        cert
    }

    /// Consume runner events until exit, then finalize.
    pub(crate) async fn stream(mut self, mut handle: RunHandle) -> Certificate {
        let kind = self.summary.kind;
        let mut exit_code = None;

        while let Some(event) = handle.next_event().await {
            match event {
                RunnerEvent::Stdout(chunk) => {
                    for tick in self.decoder.push(&chunk) {
                        self.tick(tick).await;
                    }
                }
                RunnerEvent::Exited { code } => {
                    exit_code = code;
                    break;
                }
            }
        }

        for tick in self.decoder.finish() {
            self.tick(tick).await;
        }

        debug!(%kind, exit_code = ?exit_code, "runner finished; finalizing");
        self.finalize(exit_code).await
    }

    async fn tick(&mut self, event: ProgressEvent) {
        let kind = self.summary.kind;
        debug!(%kind, percent = event.percent, "progress");

        if let Err(e) = self.journal_write(JournalRecord::in_progress(event.percent)).await {
            warn!(%kind, error = %e, "failed to journal progress tick");
        }
        self.sink.push_progress(event.percent);
    }

    async fn journal_write(&self, record: JournalRecord) -> crate::errors::Result<()> {
        write_off_runtime(&self.journal, self.summary.kind, record).await
    }

    /// Free the slot before the terminal frame goes out, so a subscriber
    /// reacting to `done` can resubmit at once.
    fn release_slot(&self) {
        self.slots.clear(self.summary.kind);
    }

    async fn finalize(mut self, exit_code: Option<i32>) -> Certificate {
        let kind = self.summary.kind;

        let status = if self.fail_on_nonzero_exit && exit_code != Some(0) {
            CertificateStatus::Failed
        } else {
            CertificateStatus::Success
        };
        let cert = Certificate::issue(&self.summary, status);

        match self.journal_write(JournalRecord::Finished(cert.clone())).await {
            Ok(()) => {
                info!(%kind, status = ?cert.status, exit_code = ?exit_code, "job finished");
                self.release_slot();
                if cert.is_success() {
                    self.sink.send_terminal(Frame::Progress(100)).await;
                }
                self.sink.send_terminal(Frame::Done(cert.clone())).await;
                cert
            }
            Err(e) => {
                let err = JobError::FinalizationFailure(e.to_string());
                error!(%kind, error = %err, "job finalization failed");

                let failed = cert.with_status(CertificateStatus::Failed);
                if let Err(e) = self.journal_write(JournalRecord::Finished(failed.clone())).await {
                    warn!(%kind, error = %e, "failed to journal FAILED certificate");
                }
                self.release_slot();
                self.sink.send_terminal(Frame::Done(failed.clone())).await;
                failed
            }
        }
    }
}
