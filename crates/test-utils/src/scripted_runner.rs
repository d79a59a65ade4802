use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use wipeguard::errors::JobError;
use wipeguard::exec::{LaunchSpec, ProcessRunner, RunHandle, RunnerEvent};
use wipeguard::job::Credential;

use crate::builders::TEST_PASSWORD;

/// One step of a scripted process run.
#[derive(Debug, Clone)]
pub enum Step {
    /// Emit a raw stdout chunk.
    Chunk(String),
    Delay(Duration),
    /// Block until [`ScriptedRunner::release`] is called.
    WaitRelease,
    /// Exit with the given code. Implied `Some(0)` if the script ends without one.
    Exit(Option<i32>),
}

impl Step {
    pub fn chunk(s: &str) -> Self {
        Step::Chunk(s.to_string())
    }
}

/// A launch as seen by the runner. The credential itself is consumed on
/// launch, only the outcome of comparing it is kept.
#[derive(Debug, Clone)]
pub struct LaunchRecord {
    pub spec: LaunchSpec,
    /// Whether the stdin line equalled the expected credential plus `\n`.
    pub credential_matched: bool,
}

/// A fake process runner that:
/// - records every launch (spec + whether the credential was the expected one)
/// - replays the same script for each launch, or refuses to launch.
pub struct ScriptedRunner {
    steps: Vec<Step>,
    launch_error: Option<String>,
    expected_credential: String,
    launches: Arc<Mutex<Vec<LaunchRecord>>>,
    release: Arc<Notify>,
}

impl ScriptedRunner {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            launch_error: None,
            expected_credential: TEST_PASSWORD.to_string(),
            launches: Arc::new(Mutex::new(Vec::new())),
            release: Arc::new(Notify::new()),
        }
    }

    /// Runner whose every launch fails with `LaunchFailure(reason)`.
    pub fn failing(reason: &str) -> Self {
        Self {
            launch_error: Some(reason.to_string()),
            ..Self::new(Vec::new())
        }
    }

    /// Let a script parked on [`Step::WaitRelease`] continue.
    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn launches(&self) -> Vec<LaunchRecord> {
        self.launches.lock().unwrap().clone()
    }

    pub fn launch_count(&self) -> usize {
        self.launches.lock().unwrap().len()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn launch(
        &self,
        spec: LaunchSpec,
        credential: Credential,
    ) -> Pin<Box<dyn Future<Output = Result<RunHandle, JobError>> + Send + '_>> {
        Box::pin(async move {
            let line = credential.into_stdin_line();
            let credential_matched =
                line.strip_suffix(b"\n") == Some(self.expected_credential.as_bytes());
            drop(line);
            self.launches.lock().unwrap().push(LaunchRecord {
                spec,
                credential_matched,
            });

            if let Some(reason) = &self.launch_error {
                return Err(JobError::LaunchFailure(reason.clone()));
            }

            let (tx, rx) = mpsc::channel(16);
            let steps = self.steps.clone();
            let release = Arc::clone(&self.release);

            tokio::spawn(async move {
                for step in steps {
                    match step {
                        Step::Chunk(chunk) => {
                            let _ = tx.send(RunnerEvent::Stdout(chunk)).await;
                        }
                        Step::Delay(d) => tokio::time::sleep(d).await,
                        Step::WaitRelease => release.notified().await,
                        Step::Exit(code) => {
                            let _ = tx.send(RunnerEvent::Exited { code }).await;
                            return;
                        }
                    }
                }
                let _ = tx.send(RunnerEvent::Exited { code: Some(0) }).await;
            });

            Ok(RunHandle::new(rx))
        })
    }
}
