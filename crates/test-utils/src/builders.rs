#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use wipeguard::config::{FactoryResetJobSection, JobsSection, WipeJobSection};
use wipeguard::exec::ProcessRunner;
use wipeguard::job::{Credential, JobRequest};
use wipeguard::journal::{MemoryJournal, StatusJournal};
use wipeguard::orchestrator::Orchestrator;
use wipeguard::types::WipeMethod;

pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// Builder for `JobsSection`. Starts without an elevation prefix so tests
/// never reach for `sudo`.
pub struct JobsSectionBuilder {
    jobs: JobsSection,
}

impl JobsSectionBuilder {
    pub fn new() -> Self {
        Self {
            jobs: JobsSection {
                elevate: Vec::new(),
                working_dir: PathBuf::from("."),
                reassemble_partial_lines: true,
                fail_on_nonzero_exit: false,
                wipe: WipeJobSection {
                    program: "wiper".to_string(),
                    device_prefix: "/dev/".to_string(),
                },
                factory_reset: FactoryResetJobSection {
                    program: "factoryreset".to_string(),
                    confirm: "y".to_string(),
                },
            },
        }
    }

    pub fn with_elevate(mut self, prefix: &[&str]) -> Self {
        self.jobs.elevate = prefix.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.jobs.working_dir = dir.into();
        self
    }

    pub fn with_wipe_program(mut self, program: &str) -> Self {
        self.jobs.wipe.program = program.to_string();
        self
    }

    pub fn with_factory_program(mut self, program: &str) -> Self {
        self.jobs.factory_reset.program = program.to_string();
        self
    }

    pub fn with_reassembly(mut self, on: bool) -> Self {
        self.jobs.reassemble_partial_lines = on;
        self
    }

    pub fn with_fail_on_nonzero_exit(mut self, on: bool) -> Self {
        self.jobs.fail_on_nonzero_exit = on;
        self
    }

    pub fn build(self) -> JobsSection {
        self.jobs
    }
}

impl Default for JobsSectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn wipe_request(device: &str, method: WipeMethod) -> JobRequest {
    JobRequest::wipe(device, method, Credential::new(TEST_PASSWORD))
}

pub fn factory_request() -> JobRequest {
    JobRequest::factory_reset(Credential::new(TEST_PASSWORD))
}

/// Orchestrator over an in-memory journal. Returns the journal for
/// assertions.
pub fn orchestrator_with(
    jobs: JobsSection,
    runner: Arc<dyn ProcessRunner>,
) -> (Arc<Orchestrator>, Arc<MemoryJournal>) {
    let journal = Arc::new(MemoryJournal::new());
    let orch = Orchestrator::new(jobs, Arc::clone(&journal) as Arc<dyn StatusJournal>, runner);
    (Arc::new(orch), journal)
}
