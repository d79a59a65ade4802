// src/exec/launch.rs

use std::path::{Path, PathBuf};

use crate::config::JobsSection;
use crate::job::JobSummary;
use crate::types::{JobKind, WipeMethod};

/// Fully resolved description of one privileged process launch.
///
/// Holds no secret; safe to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Elevation prefix (e.g. `sudo -S`); empty to run `program` directly.
    pub elevate: Vec<String>,
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Lines written to stdin after the credential line.
    pub extra_input: Vec<String>,
}

impl LaunchSpec {
    /// Resolve the launch for a job from the `[jobs]` settings.
    pub fn for_job(jobs: &JobsSection, summary: &JobSummary) -> Self {
        match summary.kind {
            JobKind::Wipe => {
                let device = summary.device.as_deref().unwrap_or_default();
                let method = summary.method.unwrap_or(WipeMethod::ZeroFill);
                Self {
                    elevate: jobs.elevate.clone(),
                    program: jobs.wipe.program.clone(),
                    args: vec![
                        format!("{}{}", jobs.wipe.device_prefix, device),
                        method.wiper_arg().to_string(),
                    ],
                    working_dir: jobs.working_dir.clone(),
                    extra_input: Vec::new(),
                }
            }
            JobKind::FactoryReset => Self {
                elevate: jobs.elevate.clone(),
                program: jobs.factory_reset.program.clone(),
                args: Vec::new(),
                working_dir: jobs.working_dir.clone(),
                extra_input: vec![jobs.factory_reset.confirm.clone()],
            },
        }
    }

    /// Executable and argument vector actually passed to the OS.
    pub fn command_line(&self) -> (String, Vec<String>) {
        match self.elevate.split_first() {
            Some((elevator, elevate_args)) => {
                let mut args = elevate_args.to_vec();
                args.push(self.program.clone());
                args.extend(self.args.iter().cloned());
                (elevator.clone(), args)
            }
            None => (self.program.clone(), self.args.clone()),
        }
    }

    /// Where `program` will be looked up, if it is a path rather than a bare
    /// name resolved through `PATH`.
    pub fn program_path(&self) -> Option<PathBuf> {
        let program = Path::new(&self.program);
        if program.components().count() > 1 || program.is_absolute() {
            Some(self.working_dir.join(program))
        } else {
            None
        }
    }
}
