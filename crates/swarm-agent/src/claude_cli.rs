use crate::backend::{AgentBackend, BackendOutput, BackendRequest, RunMode};
use crate::worker::WorkerDefinition;
use async_trait::async_trait;
use std::process::Stdio;
use swarm_core::{SwarmError, SwarmResult};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

/// Claude Code CLI backend.
///
/// Spawns a fresh `claude --print` process per invocation in the project root,
/// so every worker starts with an isolated context. Uses the user's existing
/// Claude Code login; no API key is handled here.
pub struct ClaudeCliBackend {
    binary: String,
}

impl ClaudeCliBackend {
    /// A backend that runs `claude` from `PATH`.
    pub fn new() -> Self {
        Self {
            binary: "claude".to_string(),
        }
    }

    /// Use a different executable (a wrapper script, an absolute path).
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Command-line arguments for one run.
    pub fn build_args(worker: &WorkerDefinition, prompt: &str, mode: RunMode) -> Vec<String> {
        let mut args = vec!["--print".to_string(), "--output-format".to_string()];
        match mode {
            RunMode::Headless => args.push("json".into()),
            RunMode::Observable => {
                args.push("stream-json".into());
                args.push("--verbose".into());
            }
        }
        args.push("--max-turns".into());
        args.push(worker.max_turns.to_string());
        if !worker.allowed_tools.is_empty() {
            args.push("--allowedTools".into());
            args.push(worker.allowed_tools.join(","));
        }
        args.push("--system-prompt".into());
        args.push(worker.instructions.clone());
        args.push("-p".into());
        args.push(prompt.to_string());
        args
    }

    fn spawn_error(&self, e: std::io::Error) -> SwarmError {
        if e.kind() == std::io::ErrorKind::NotFound {
            SwarmError::Agent(format!(
                "'{}' CLI not found. Is Claude Code installed?",
                self.binary
            ))
        } else {
            SwarmError::Agent(format!("Failed to run '{}': {e}", self.binary))
        }
    }

    async fn run_headless(&self, mut cmd: Command) -> SwarmResult<BackendOutput> {
        let output = cmd.output().await.map_err(|e| self.spawn_error(e))?;
        Ok(BackendOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_success: output.status.success(),
        })
    }

    /// Stream stdout line by line, echoing progress to stderr, and keep every
    /// line so the final result event is still parsed.
    async fn run_observable(&self, mut cmd: Command) -> SwarmResult<BackendOutput> {
        cmd.stdout(Stdio::piped()).stderr(Stdio::inherit());
        let mut child = cmd.spawn().map_err(|e| self.spawn_error(e))?;

        let mut captured = String::new();
        if let Some(stdout) = child.stdout.take() {
            let mut reader = BufReader::new(stdout);
            let mut terminal = tokio::io::stderr();
            let mut buf = Vec::new();
            // Lossy per line, as in headless mode: stray bytes never fail a run.
            while reader.read_until(b'\n', &mut buf).await? > 0 {
                let raw = String::from_utf8_lossy(&buf);
                let line = raw.trim_end_matches(['\n', '\r']);
                if let Some(progress) = progress_line(line) {
                    terminal.write_all(progress.as_bytes()).await?;
                    terminal.flush().await?;
                }
                captured.push_str(line);
                captured.push('\n');
                buf.clear();
            }
        }

        let status = child.wait().await?;
        Ok(BackendOutput {
            stdout: captured,
            stderr: String::new(),
            exit_success: status.success(),
        })
    }
}

impl Default for ClaudeCliBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Human-readable echo of one stream event, if it carries any.
fn progress_line(line: &str) -> Option<String> {
    let event: serde_json::Value = serde_json::from_str(line).ok()?;
    if event["type"] != "assistant" {
        return None;
    }
    let mut out = String::new();
    for block in event["message"]["content"].as_array()? {
        match block["type"].as_str() {
            Some("text") => {
                if let Some(text) = block["text"].as_str() {
                    out.push_str(text.trim());
                    out.push('\n');
                }
            }
            Some("tool_use") => {
                let name = block["name"].as_str().unwrap_or("tool");
                out.push_str(&format!("  -> {name}\n"));
            }
            _ => {}
        }
    }
    (!out.is_empty()).then_some(out)
}

#[async_trait]
impl AgentBackend for ClaudeCliBackend {
    fn name(&self) -> &str {
        "claude-cli"
    }

    async fn run(&self, request: BackendRequest<'_>) -> SwarmResult<BackendOutput> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(Self::build_args(request.worker, request.prompt, request.mode))
            .current_dir(request.working_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        tracing::info!(
            worker = %request.worker.name,
            prompt_len = request.prompt.len(),
            mode = ?request.mode,
            "Spawning claude CLI"
        );

        match request.mode {
            RunMode::Headless => self.run_headless(cmd).await,
            RunMode::Observable => self.run_observable(cmd).await,
        }
    }
}
