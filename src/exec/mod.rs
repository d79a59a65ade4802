// src/exec/mod.rs

//! Privileged process execution layer.
//!
//! - [`backend`] defines the `ProcessRunner` trait, the `RunHandle` a launch
//!   returns, and the `RunnerEvent`s it yields.
//! - [`launch`] resolves a job into a `LaunchSpec` (elevation prefix,
//!   program, arguments, stdin lines after the credential).
//! - [`task_runner`] is the `tokio::process` implementation used in
//!   production.

pub mod backend;
pub mod launch;
pub mod task_runner;

pub use backend::{ProcessRunner, RunHandle, RunnerEvent};
pub use launch::LaunchSpec;
pub use task_runner::CommandRunner;
