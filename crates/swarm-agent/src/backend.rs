use crate::worker::WorkerDefinition;
use async_trait::async_trait;
use std::path::Path;
use swarm_core::SwarmResult;

/// How a worker run is presented.
///
/// Only presentation differs: both modes capture the final reply, so parsing
/// and scheduling never depend on the mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Capture everything, show nothing.
    #[default]
    Headless,
    /// Echo progress to the terminal while capturing.
    Observable,
}

/// One run of the external capability.
#[derive(Debug, Clone, Copy)]
pub struct BackendRequest<'a> {
    /// Worker profile to run.
    pub worker: &'a WorkerDefinition,
    /// Full prompt text.
    pub prompt: &'a str,
    /// Project root the worker operates in.
    pub working_dir: &'a Path,
    /// Presentation mode.
    pub mode: RunMode,
}

/// Raw output of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendOutput {
    /// Everything the run printed to stdout.
    pub stdout: String,
    /// Captured stderr. Empty when stderr went to the terminal.
    pub stderr: String,
    /// Whether the process exited successfully.
    pub exit_success: bool,
}

/// The seam to whatever actually performs a task.
///
/// An `Err` means the capability could not be run at all (missing binary,
/// spawn failure). The invoker turns it into a failed result; it never reaches
/// the scheduler.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Run `request.worker` on `request.prompt` to completion.
    async fn run(&self, request: BackendRequest<'_>) -> SwarmResult<BackendOutput>;
}
