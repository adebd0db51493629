use crate::config::SwarmConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use swarm_agent::{
    AgentBackend, AgentInvoker, FileArtifactSink, InvocationRequest, RunMode, WorkerDefinition,
};
use swarm_core::{AgentKind, AgentResult, SwarmError, SwarmResult};
use swarm_session::{
    FileSessionStore, SessionReport, SessionStore, SessionSummary, SwarmSession,
};
use tracing::{info, warn};

/// Drives one session at a time: opens or resumes it, routes every agent
/// invocation through the gateway and persists the session after each
/// mutation.
///
/// The orchestrator is the single owner of the current session. Concurrent
/// invocations (the pipeline's review fan-out) go straight to the invoker and
/// hand their results back; only the orchestrator applies them.
pub struct Orchestrator {
    project_root: PathBuf,
    config: SwarmConfig,
    store: Arc<dyn SessionStore>,
    pub(crate) invoker: AgentInvoker,
    session: Option<SwarmSession>,
}

impl Orchestrator {
    /// Assemble an orchestrator from explicit parts.
    pub fn new(
        project_root: impl Into<PathBuf>,
        config: SwarmConfig,
        store: Arc<dyn SessionStore>,
        invoker: AgentInvoker,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            config,
            store,
            invoker,
            session: None,
        }
    }

    /// Wire up file-backed storage, artifacts and timeouts from `config`.
    pub async fn open(
        project_root: &Path,
        config: SwarmConfig,
        backend: Arc<dyn AgentBackend>,
    ) -> SwarmResult<Self> {
        let workspace = config.workspace(project_root);
        let store = Arc::new(FileSessionStore::new(config.state_dir(project_root)).await?);
        let mode = if config.orchestrator.observable {
            RunMode::Observable
        } else {
            RunMode::Headless
        };
        let invoker = AgentInvoker::new(backend, project_root)
            .with_artifacts(Arc::new(FileArtifactSink::new(workspace)))
            .with_timeout(config.invocation_timeout())
            .with_mode(mode);
        Ok(Self::new(project_root, config, store, invoker))
    }

    /// Effective configuration.
    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    /// Project root the workers run in.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// The current session, if one was started or resumed.
    pub fn session(&self) -> Option<&SwarmSession> {
        self.session.as_ref()
    }

    // --- Session lifecycle ---

    /// Create and persist a new session; it becomes the current one.
    pub async fn start_session(&mut self, feature: &str) -> SwarmResult<String> {
        let session = SwarmSession::new(feature);
        self.store.save(&session).await?;
        info!(session_id = %session.session_id, "Session started");
        let id = session.session_id.clone();
        self.session = Some(session);
        Ok(id)
    }

    /// Load a stored session as the current one. Returns `false` if there is
    /// no such session.
    pub async fn resume_session(&mut self, session_id: &str) -> SwarmResult<bool> {
        match self.store.get(session_id).await? {
            Some(session) => {
                info!(
                    session_id = %session_id,
                    tasks = session.tasks.len(),
                    "Session resumed"
                );
                self.session = Some(session);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Every stored session, most recently updated first.
    pub async fn list_sessions(&self) -> SwarmResult<Vec<SessionSummary>> {
        self.store.list().await
    }

    /// Progress snapshot of the current session.
    pub fn status(&self) -> Option<SessionReport> {
        self.session.as_ref().map(SwarmSession::report)
    }

    /// Handoff text for the current session.
    pub fn briefing(&self) -> Option<String> {
        self.session.as_ref().map(SwarmSession::briefing)
    }

    /// Apply `mutate` to a copy of the session, persist the copy and only then
    /// make it current. A failed save leaves the in-memory session untouched.
    pub(crate) async fn update_session<F>(&mut self, mutate: F) -> SwarmResult<()>
    where
        F: FnOnce(&mut SwarmSession),
    {
        let Some(current) = &self.session else {
            return Ok(());
        };
        let mut next = current.clone();
        mutate(&mut next);
        next.touch();
        self.store.save(&next).await?;
        self.session = Some(next);
        Ok(())
    }

    pub(crate) fn require_session(&self) -> SwarmResult<&SwarmSession> {
        self.session
            .as_ref()
            .ok_or_else(|| SwarmError::Orchestrator("No active session".into()))
    }

    // --- Agent invocation gateway ---

    /// Run a built-in worker on `task` and record the result in the session.
    pub async fn invoke_agent(
        &mut self,
        kind: AgentKind,
        task: &str,
        context_files: &[String],
        additional_context: Option<&str>,
    ) -> SwarmResult<AgentResult> {
        let worker = self.config.worker_for(kind);
        self.invoke_worker(&worker, task, context_files, additional_context)
            .await
    }

    /// Run a configured custom worker by name.
    pub async fn invoke_custom(
        &mut self,
        name: &str,
        task: &str,
        context_files: &[String],
        additional_context: Option<&str>,
    ) -> SwarmResult<AgentResult> {
        let worker = self
            .config
            .custom_worker(name)
            .ok_or_else(|| SwarmError::Agent(format!("Unknown custom agent: {name}")))?;
        self.invoke_worker(&worker, task, context_files, additional_context)
            .await
    }

    /// Gateway: invoke `worker` with the session's recent activity appended
    /// to its context, then record the digest (and blocker) and persist.
    ///
    /// Agent failures come back as unsuccessful results; only a persistence
    /// failure is an `Err`.
    pub async fn invoke_worker(
        &mut self,
        worker: &WorkerDefinition,
        task: &str,
        context_files: &[String],
        additional_context: Option<&str>,
    ) -> SwarmResult<AgentResult> {
        let result = self
            .dispatch(worker, task, context_files, additional_context)
            .await;
        self.record(&result).await?;
        Ok(result)
    }

    /// Invoke without touching the session.
    pub(crate) async fn dispatch(
        &self,
        worker: &WorkerDefinition,
        task: &str,
        context_files: &[String],
        additional_context: Option<&str>,
    ) -> AgentResult {
        let context = self.recent_context(additional_context);
        self.invoker
            .invoke(InvocationRequest {
                worker,
                task,
                context_files,
                additional_context: context.as_deref(),
            })
            .await
    }

    /// Fold a result into the session history and persist.
    pub(crate) async fn record(&mut self, result: &AgentResult) -> SwarmResult<()> {
        if result.blocked {
            warn!(
                agent = %result.agent_kind,
                reason = result.block_reason.as_deref().unwrap_or_default(),
                "Agent blocked"
            );
        }
        let cap = self.config.orchestrator.summary_cap;
        self.update_session(|session| session.record_result(result, cap))
            .await
    }

    /// `additional` followed by a `## Recent Activity` block of the newest
    /// digests, when there are any.
    pub(crate) fn recent_context(&self, additional: Option<&str>) -> Option<String> {
        let additional = additional.filter(|a| !a.trim().is_empty());
        let recent = self
            .session
            .as_ref()
            .map(|s| s.recent_summaries(self.config.orchestrator.recent_context))
            .unwrap_or_default();
        if recent.is_empty() {
            return additional.map(String::from);
        }
        let block = format!("## Recent Activity\n{}", recent.join("\n"));
        Some(match additional {
            Some(extra) => format!("{extra}\n\n{block}"),
            None => block,
        })
    }
}
