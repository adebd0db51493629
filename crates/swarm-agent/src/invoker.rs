use crate::artifacts::{ArtifactSink, NoopArtifactSink};
use crate::backend::{AgentBackend, BackendOutput, BackendRequest, RunMode};
use crate::parser::parse_reply;
use crate::prompt::build_prompt;
use crate::worker::WorkerDefinition;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use swarm_core::text::tail_chars;
use swarm_core::AgentResult;
use tracing::{info, warn};
use uuid::Uuid;

/// Default hard limit on a single invocation.
pub const DEFAULT_INVOCATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Characters of stderr quoted in the summary of a crashed run.
const STDERR_SUMMARY_CHARS: usize = 500;

/// What to run: a worker, its task text and the context it should see.
#[derive(Debug, Clone, Copy)]
pub struct InvocationRequest<'a> {
    /// Worker profile to run.
    pub worker: &'a WorkerDefinition,
    /// Task text.
    pub task: &'a str,
    /// File hints listed in the prompt.
    pub context_files: &'a [String],
    /// Extra prompt section, usually the recent activity.
    pub additional_context: Option<&'a str>,
}

/// Runs one worker invocation end to end: prompt, backend call under a hard
/// timeout, reply parsing, result normalization and debug artifacts.
///
/// [`AgentInvoker::invoke`] never fails. Timeouts, a missing capability and
/// unparseable replies all come back as a result with `success == false`.
/// The invoker holds no session state, so concurrent invocations only need
/// `&self`.
pub struct AgentInvoker {
    backend: Arc<dyn AgentBackend>,
    artifacts: Arc<dyn ArtifactSink>,
    project_root: PathBuf,
    timeout: Duration,
    mode: RunMode,
}

impl AgentInvoker {
    /// An invoker with no artifacts and the default timeout.
    pub fn new(backend: Arc<dyn AgentBackend>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            artifacts: Arc::new(NoopArtifactSink),
            project_root: project_root.into(),
            timeout: DEFAULT_INVOCATION_TIMEOUT,
            mode: RunMode::Headless,
        }
    }

    /// Record prompts, outputs and results through `artifacts`.
    pub fn with_artifacts(mut self, artifacts: Arc<dyn ArtifactSink>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Set the hard limit on one invocation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the presentation mode.
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Presentation mode in use.
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Hard limit on one invocation.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Generate an invocation id: `<YYYYmmdd_HHMMSS>_<6 hex>`.
    pub fn invocation_id() -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}_{}", Utc::now().format("%Y%m%d_%H%M%S"), &suffix[..6])
    }

    /// Run `request` and return its normalized result.
    pub async fn invoke(&self, request: InvocationRequest<'_>) -> AgentResult {
        let worker = request.worker;
        let invocation_id = Self::invocation_id();
        let start = Instant::now();

        let prompt = build_prompt(
            request.task,
            request.context_files,
            request.additional_context,
            &worker.output_format,
        );
        if let Err(e) = self
            .artifacts
            .write_prompt(worker, &invocation_id, &prompt)
            .await
        {
            warn!(worker = %worker.name, error = %e, "Failed to write prompt artifact");
        }

        let backend_request = BackendRequest {
            worker,
            prompt: &prompt,
            working_dir: &self.project_root,
            mode: self.mode,
        };

        info!(
            worker = %worker.name,
            invocation_id = %invocation_id,
            backend = self.backend.name(),
            "Invoking agent"
        );

        let result = match tokio::time::timeout(self.timeout, self.backend.run(backend_request)).await
        {
            Err(_) => {
                let message = format!("Agent timed out after {:?}", self.timeout);
                AgentResult::failure(worker.kind, &invocation_id, &message).with_raw_output(message)
            }
            Ok(Err(e)) => {
                let message = format!("Error invoking agent: {e}");
                AgentResult::failure(worker.kind, &invocation_id, &message).with_raw_output(message)
            }
            Ok(Ok(output)) => {
                if let Err(e) = self
                    .artifacts
                    .write_output(worker, &invocation_id, &output.stdout)
                    .await
                {
                    warn!(worker = %worker.name, error = %e, "Failed to write output artifact");
                }
                result_from_output(worker, &invocation_id, output)
            }
        };
        let result = result.with_elapsed_ms(start.elapsed().as_millis() as u64);

        if let Err(e) = self.artifacts.write_result(worker, &result).await {
            warn!(worker = %worker.name, error = %e, "Failed to write result artifact");
        }

        info!(
            worker = %worker.name,
            invocation_id = %invocation_id,
            success = result.success,
            blocked = result.blocked,
            elapsed_ms = result.elapsed_ms,
            "Agent finished"
        );
        result
    }
}

/// Map a finished run onto a result.
///
/// Success needs a clean exit, a non-error reply and no self-reported block.
fn result_from_output(worker: &WorkerDefinition, invocation_id: &str, output: BackendOutput) -> AgentResult {
    let parsed = parse_reply(&output.stdout);
    let report = parsed.report;
    let success = output.exit_success && parsed.status.succeeded() && !report.blocked;

    let mut summary = report.summary;
    if !output.exit_success && summary.trim().is_empty() {
        summary = format!(
            "Agent process exited unsuccessfully: {}",
            tail_chars(output.stderr.trim(), STDERR_SUMMARY_CHARS)
        );
    }

    let raw_output = (!success).then(|| {
        if output.stderr.trim().is_empty() {
            output.stdout
        } else {
            format!("{}\n--- stderr ---\n{}", output.stdout, output.stderr)
        }
    });

    AgentResult {
        agent_kind: worker.kind,
        task_id: invocation_id.to_string(),
        success,
        summary,
        files_changed: report.files_changed,
        files_created: report.files_created,
        issues: report.issues,
        suggestions: report.suggestions,
        blocked: report.blocked,
        block_reason: report.block_reason,
        raw_output,
        elapsed_ms: 0,
        tokens_used: report.tokens_used,
        details: report.details,
    }
    .normalized()
}
