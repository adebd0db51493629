use crate::engine::Orchestrator;
use crate::planner::{architect_task, build_plan};
use swarm_core::{AgentKind, AgentResult, SwarmError, SwarmResult, TaskStatus};
use swarm_session::{SessionStatus, Task};
use tracing::{debug, info, warn};

impl Orchestrator {
    /// Ask the architect for a plan and attach it to the session.
    ///
    /// Starts a session for `feature` if none is active. Returns an empty list
    /// (and leaves the session's tasks alone) when the architect fails.
    pub async fn plan_feature(&mut self, feature: &str) -> SwarmResult<Vec<Task>> {
        if self.session().is_none() {
            self.start_session(feature).await?;
        }

        info!("Running architect for planning");
        let result = self
            .invoke_agent(AgentKind::Architect, &architect_task(feature), &[], None)
            .await?;
        if !result.success {
            warn!(summary = %result.summary, "Architect failed to create a plan");
            return Ok(Vec::new());
        }

        let mut planned = Vec::new();
        self.update_session(|session| {
            session.architecture = Some(result.summary.clone());
            planned = build_plan(&result, session);
            session.set_tasks(planned.clone());
            session.status = SessionStatus::Planned;
        })
        .await?;

        let session = self.require_session()?;
        if session.tasks.has_cycle() {
            warn!(session_id = %session.session_id, "Plan contains a dependency cycle; those tasks will never run");
        }
        info!(tasks = planned.len(), "Plan attached");
        Ok(planned)
    }

    /// One linear pass over the task list.
    ///
    /// Each pending task whose dependencies are all completed is marked
    /// running, persisted, invoked with its hints plus every file the completed
    /// tasks touched, and then gets its result attached and persisted. Tasks
    /// unblocked by work later in the same pass wait for the next call.
    /// Returns `(task_id, result)` for every task run in this pass.
    pub async fn execute_plan(&mut self) -> SwarmResult<Vec<(String, AgentResult)>> {
        let ids: Vec<String> = {
            let session = self.require_session()?;
            if session.tasks.is_empty() {
                return Err(SwarmError::Plan(
                    "No plan to execute. Run plan first.".into(),
                ));
            }
            session.tasks.iter().map(|t| t.id.clone()).collect()
        };

        let mut ran = Vec::new();
        for id in ids {
            let Some((task, files)) = self.runnable(&id)? else {
                continue;
            };

            self.update_session(|session| {
                if let Some(t) = session.tasks.get_mut(&id) {
                    t.status = TaskStatus::Running;
                }
            })
            .await?;
            info!(task_id = %id, agent = %task.agent_kind, "Executing task");

            let worker = self.config().worker_for(task.agent_kind);
            let result = self
                .dispatch(&worker, &task.description, &files, None)
                .await;

            let cap = self.config().orchestrator.summary_cap;
            self.update_session(|session| {
                session.record_result(&result, cap);
                if let Some(t) = session.tasks.get_mut(&id) {
                    t.attach_result(result.clone());
                }
            })
            .await?;
            ran.push((id, result));
        }

        self.update_session(|session| session.refresh_status()).await?;
        if let Some(report) = self.status() {
            info!(
                completed = report.completed,
                failed = report.failed,
                blocked = report.blocked,
                pending = report.pending,
                "Plan pass finished"
            );
        }
        Ok(ran)
    }

    /// The task and its context files, if it is pending with every
    /// dependency completed.
    fn runnable(&self, id: &str) -> SwarmResult<Option<(Task, Vec<String>)>> {
        let graph = &self.require_session()?.tasks;
        let Some(task) = graph.get(id) else {
            return Ok(None);
        };
        if task.status != TaskStatus::Pending {
            return Ok(None);
        }
        if !graph.deps_met(task) {
            debug!(task_id = %id, deps = ?task.depends_on, "Dependencies not met, skipping");
            return Ok(None);
        }
        Ok(Some((task.clone(), graph.context_files_for(task))))
    }
}
