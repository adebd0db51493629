use crate::worker::WorkerDefinition;
use async_trait::async_trait;
use std::path::PathBuf;
use swarm_core::{AgentResult, SwarmResult};
use tracing::debug;

/// Destination for per-invocation debug artifacts.
///
/// Artifacts are a tracing aid: the invoker logs write failures and carries on.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// The full prompt sent to the worker.
    async fn write_prompt(
        &self,
        worker: &WorkerDefinition,
        invocation_id: &str,
        prompt: &str,
    ) -> SwarmResult<()>;

    /// The raw captured output.
    async fn write_output(
        &self,
        worker: &WorkerDefinition,
        invocation_id: &str,
        output: &str,
    ) -> SwarmResult<()>;

    /// The normalized result.
    async fn write_result(&self, worker: &WorkerDefinition, result: &AgentResult)
        -> SwarmResult<()>;
}

/// Writes artifacts under a workspace directory:
///
/// - `tasks/<worker>_<invocation>.md`: prompt
/// - `tasks/<worker>_<invocation>.log`: raw output
/// - `summaries/<worker>_<invocation>.json`: result
pub struct FileArtifactSink {
    workspace: PathBuf,
}

impl FileArtifactSink {
    /// Write artifacts under `workspace`.
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
        }
    }

    fn path(&self, subdir: &str, worker: &WorkerDefinition, invocation_id: &str, ext: &str) -> PathBuf {
        self.workspace
            .join(subdir)
            .join(format!("{}_{invocation_id}.{ext}", file_stem(&worker.name)))
    }

    async fn write(&self, path: PathBuf, contents: &str) -> SwarmResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, contents).await?;
        debug!(path = %path.display(), "Artifact written");
        Ok(())
    }
}

/// Worker names come from configuration; keep them to a safe file stem.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

#[async_trait]
impl ArtifactSink for FileArtifactSink {
    async fn write_prompt(
        &self,
        worker: &WorkerDefinition,
        invocation_id: &str,
        prompt: &str,
    ) -> SwarmResult<()> {
        self.write(self.path("tasks", worker, invocation_id, "md"), prompt)
            .await
    }

    async fn write_output(
        &self,
        worker: &WorkerDefinition,
        invocation_id: &str,
        output: &str,
    ) -> SwarmResult<()> {
        self.write(self.path("tasks", worker, invocation_id, "log"), output)
            .await
    }

    async fn write_result(
        &self,
        worker: &WorkerDefinition,
        result: &AgentResult,
    ) -> SwarmResult<()> {
        let json = serde_json::to_string_pretty(result)?;
        self.write(self.path("summaries", worker, &result.task_id, "json"), &json)
            .await
    }
}

/// Discards every artifact.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopArtifactSink;

#[async_trait]
impl ArtifactSink for NoopArtifactSink {
    async fn write_prompt(&self, _: &WorkerDefinition, _: &str, _: &str) -> SwarmResult<()> {
        Ok(())
    }

    async fn write_output(&self, _: &WorkerDefinition, _: &str, _: &str) -> SwarmResult<()> {
        Ok(())
    }

    async fn write_result(&self, _: &WorkerDefinition, _: &AgentResult) -> SwarmResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::{custom_worker, default_worker};
    use swarm_core::AgentKind;

    #[tokio::test]
    async fn test_file_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileArtifactSink::new(tmp.path());
        let worker = default_worker(AgentKind::Coder);
        let result = AgentResult::success(AgentKind::Coder, "20250101_120000_abc123", "done");

        sink.write_prompt(&worker, &result.task_id, "# Task").await.unwrap();
        sink.write_output(&worker, &result.task_id, "raw").await.unwrap();
        sink.write_result(&worker, &result).await.unwrap();

        let prompt = tmp.path().join("tasks/coder_20250101_120000_abc123.md");
        assert_eq!(tokio::fs::read_to_string(prompt).await.unwrap(), "# Task");
        assert!(tmp.path().join("tasks/coder_20250101_120000_abc123.log").exists());

        let json = tokio::fs::read_to_string(
            tmp.path().join("summaries/coder_20250101_120000_abc123.json"),
        )
        .await
        .unwrap();
        let back: AgentResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[tokio::test]
    async fn test_custom_name_sanitized() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileArtifactSink::new(tmp.path());
        let worker = custom_worker("../db migrations", "x", None, None);
        sink.write_prompt(&worker, "id", "p").await.unwrap();
        assert!(tmp.path().join("tasks/___db_migrations_id.md").exists());
    }
}
