#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swarm_agent::{AgentBackend, BackendOutput, BackendRequest};
use swarm_core::{AgentKind, SwarmResult};
use swarm_orchestrator::{Orchestrator, SwarmConfig};
use swarm_session::SwarmSession;

/// One recorded backend call.
#[derive(Debug, Clone)]
pub struct Call {
    pub kind: AgentKind,
    pub prompt: String,
    /// Task statuses in the stored session at the time of the call, when a
    /// state probe is set.
    pub stored_statuses: Vec<(String, String)>,
}

/// Backend replying from a per-kind script. Unscripted calls succeed with
/// a plain summary.
pub struct ScriptedBackend {
    replies: Mutex<HashMap<AgentKind, VecDeque<BackendOutput>>>,
    calls: Mutex<Vec<Call>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    state_probe: Option<PathBuf>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            state_probe: None,
        }
    }

    /// Sleep this long inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Snapshot stored task statuses from this state dir on every call.
    pub fn with_state_probe(mut self, state_dir: PathBuf) -> Self {
        self.state_probe = Some(state_dir);
        self
    }

    pub fn reply(self, kind: AgentKind, stdout: impl Into<String>) -> Self {
        self.push(kind, stdout.into(), true);
        self
    }

    pub fn crash(self, kind: AgentKind) -> Self {
        self.push(kind, "Traceback: boom".to_string(), false);
        self
    }

    fn push(&self, kind: AgentKind, stdout: String, exit_success: bool) {
        self.replies
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push_back(BackendOutput {
                stdout,
                stderr: String::new(),
                exit_success,
            });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn kinds_called(&self) -> Vec<AgentKind> {
        self.calls().iter().map(|c| c.kind).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn stored_statuses(dir: &Path) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return out;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Ok(session) = serde_json::from_str::<SwarmSession>(
            &std::fs::read_to_string(&path).unwrap_or_default(),
        ) else {
            continue;
        };
        for task in session.tasks.iter() {
            out.push((task.id.clone(), task.status.to_string()));
        }
    }
    out
}

#[async_trait]
impl AgentBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn run(&self, request: BackendRequest<'_>) -> SwarmResult<BackendOutput> {
        let kind = request.worker.kind;
        let stored = self
            .state_probe
            .as_deref()
            .map(stored_statuses)
            .unwrap_or_default();
        self.calls.lock().unwrap().push(Call {
            kind,
            prompt: request.prompt.to_string(),
            stored_statuses: stored,
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let scripted = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&kind)
            .and_then(VecDeque::pop_front);
        Ok(scripted.unwrap_or_else(|| BackendOutput {
            stdout: json_reply(&format!("{kind} done"), &[]),
            stderr: String::new(),
            exit_success: true,
        }))
    }
}

/// A fenced JSON reply.
pub fn json_reply(summary: &str, files_changed: &[&str]) -> String {
    let body = serde_json::json!({
        "summary": summary,
        "files_changed": files_changed,
        "files_created": [],
    });
    format!("Work done.\n\n```json\n{body}\n```\n")
}

/// A fenced JSON reply that blocks.
pub fn blocked_reply(reason: &str) -> String {
    let body = serde_json::json!({
        "summary": "Security audit",
        "blocked": true,
        "block_reason": reason,
        "issues": [{"severity": "critical", "description": reason}],
    });
    format!("```json\n{body}\n```")
}

/// A file-backed orchestrator over a fresh project directory.
pub async fn open(
    project: &Path,
    config: SwarmConfig,
    backend: Arc<ScriptedBackend>,
) -> Orchestrator {
    Orchestrator::open(project, config, backend).await.unwrap()
}

pub fn state_dir(project: &Path) -> PathBuf {
    SwarmConfig::default().state_dir(project)
}
