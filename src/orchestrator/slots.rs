// src/orchestrator/slots.rs

//! Per-kind admission control.
//!
//! Each job kind has one slot that is either empty, holds a queued request,
//! or marks a job as running. This module performs no IO, so it can be tested
//! without Tokio or processes.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::errors::JobError;
use crate::job::JobRequest;
use crate::types::JobKind;

#[derive(Debug)]
enum SlotState {
    Queued(JobRequest),
    Running,
}

/// Observable state of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotView {
    Empty,
    Queued,
    Running,
}

/// The slot table. It is the only writer of slot state.
#[derive(Debug, Default)]
pub struct JobSlots {
    slots: Mutex<HashMap<JobKind, SlotState>>,
}

impl JobSlots {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobKind, SlotState>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve the slot for `request.kind`.
    ///
    /// Validation runs first, so an invalid request never touches the slot.
    pub fn submit(&self, request: JobRequest) -> Result<(), JobError> {
        request.validate()?;

        let kind = request.kind;
        let mut slots = self.lock();
        if slots.contains_key(&kind) {
            return Err(JobError::Conflict(kind));
        }
        slots.insert(kind, SlotState::Queued(request));
        debug!(%kind, "slot reserved");
        Ok(())
    }

    /// Move a queued job to running and hand out its request.
    pub fn attach(&self, kind: JobKind) -> Result<JobRequest, JobError> {
        let mut slots = self.lock();
        match slots.remove(&kind) {
            None => Err(JobError::NoActiveJob(kind)),
            Some(SlotState::Running) => {
                slots.insert(kind, SlotState::Running);
                Err(JobError::AlreadyAttached(kind))
            }
            Some(SlotState::Queued(request)) => {
                slots.insert(kind, SlotState::Running);
                debug!(%kind, "slot attached");
                Ok(request)
            }
        }
    }

    /// Empty the slot. Returns `false` if it was already empty.
    pub fn clear(&self, kind: JobKind) -> bool {
        let cleared = self.lock().remove(&kind).is_some();
        if cleared {
            debug!(%kind, "slot cleared");
        }
        cleared
    }

    pub fn state(&self, kind: JobKind) -> SlotView {
        match self.lock().get(&kind) {
            None => SlotView::Empty,
            Some(SlotState::Queued(_)) => SlotView::Queued,
            Some(SlotState::Running) => SlotView::Running,
        }
    }

    #[cfg(test)]
    fn is_occupied(&self, kind: JobKind) -> bool {
        self.state(kind) != SlotView::Empty
    }
}
