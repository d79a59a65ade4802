// src/exec/task_runner.rs

//! Production runner on top of `tokio::process`.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::JobError;
use crate::job::Credential;

use super::backend::{ProcessRunner, RunHandle, RunnerEvent};
use super::launch::LaunchSpec;

const READ_BUF_SIZE: usize = 4096;

/// Spawns privileged processes as real OS processes.
///
/// Processes are not killed when the handle is dropped: a job keeps running
/// after its subscriber disconnects.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner;

impl CommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for CommandRunner {
    fn launch(
        &self,
        spec: LaunchSpec,
        credential: Credential,
    ) -> Pin<Box<dyn Future<Output = Result<RunHandle, JobError>> + Send + '_>> {
        Box::pin(async move { launch_process(spec, credential).await })
    }
}

async fn launch_process(spec: LaunchSpec, credential: Credential) -> Result<RunHandle, JobError> {
    if let Some(path) = spec.program_path() {
        if !path.is_file() {
            return Err(JobError::LaunchFailure(format!(
                "executable not found: {}",
                path.display()
            )));
        }
    }

    let (program, args) = spec.command_line();
    info!(
        program = %program,
        args = ?args,
        cwd = %spec.working_dir.display(),
        "starting privileged process"
    );

    let mut child = Command::new(&program)
        .args(&args)
        .current_dir(&spec.working_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(false)
        .spawn()
        .map_err(|e| JobError::LaunchFailure(format!("spawning '{program}': {e}")))?;

    if let Some(stdin) = child.stdin.take() {
        // A process that exits without reading its input closes the pipe
        // early; its exit status is still reported below.
        if let Err(e) = feed_stdin(stdin, credential, &spec.extra_input).await {
            warn!(program = %program, error = %e, "failed to write process input");
        }
    }

    let (tx, rx) = mpsc::channel::<RunnerEvent>(64);
    tokio::spawn(pump_output(child, program, tx));

    Ok(RunHandle::new(rx))
}

/// Write the credential line, then any extra lines, then close stdin.
async fn feed_stdin(
    mut stdin: ChildStdin,
    credential: Credential,
    extra_input: &[String],
) -> std::io::Result<()> {
    let line = credential.into_stdin_line();
    stdin.write_all(&line).await?;
    drop(line);

    for line in extra_input {
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
    }
    stdin.flush().await?;
    drop(stdin);
    Ok(())
}

/// Forward stdout chunks until EOF, then report the exit status.
///
/// stderr is drained on its own task and only logged.
async fn pump_output(mut child: Child, program: String, tx: mpsc::Sender<RunnerEvent>) {
    if let Some(stderr) = child.stderr.take() {
        let program = program.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(program = %program, "stderr: {}", line);
            }
        });
    }

    if let Some(mut stdout) = child.stdout.take() {
        let mut buf = vec![0u8; READ_BUF_SIZE];
        loop {
            match stdout.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                    // The job task is gone if this fails; keep draining so
                    // the process never blocks on a full pipe.
                    let _ = tx.send(RunnerEvent::Stdout(chunk)).await;
                }
                Err(e) => {
                    warn!(program = %program, error = %e, "error reading process stdout");
                    break;
                }
            }
        }
    }

    let code = match child.wait().await {
        Ok(status) => {
            info!(
                program = %program,
                exit_code = ?status.code(),
                success = status.success(),
                "privileged process exited"
            );
            status.code()
        }
        Err(e) => {
            warn!(program = %program, error = %e, "failed to wait for process");
            None
        }
    };

    let _ = tx.send(RunnerEvent::Exited { code }).await;
}
