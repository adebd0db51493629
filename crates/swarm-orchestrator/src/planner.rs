//! Turning the architect's reply into a task graph.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;
use swarm_core::{AgentKind, AgentResult};
use swarm_session::{SwarmSession, Task};
use tracing::{debug, warn};

static TASKS_KEY: OnceLock<Regex> = OnceLock::new();

#[allow(clippy::unwrap_used)]
fn tasks_key() -> &'static Regex {
    TASKS_KEY.get_or_init(|| Regex::new(r#""tasks"\s*:\s*\["#).unwrap())
}

/// Task text handed to the architect for `feature`.
pub fn architect_task(feature: &str) -> String {
    format!(
        "Plan the implementation for:\n\n{feature}\n\n\
         Break this down into discrete tasks for: coder, reviewer, security, tester agents."
    )
}

/// One entry of the architect's `tasks` list.
#[derive(Debug, Clone, Deserialize)]
struct PlannedTask {
    #[serde(default)]
    id: Option<String>,
    agent: String,
    #[serde(alias = "description")]
    task: String,
    #[serde(default)]
    context_files: Option<Vec<String>>,
    /// Strings (`"task_0"`) or bare indices (`0`).
    #[serde(default)]
    depends_on: Option<Vec<Value>>,
}

/// The raw `tasks` list: from the structured reply, or else searched for in
/// the summary text.
fn tasks_value(result: &AgentResult) -> Option<Value> {
    if let Some(tasks) = result.details.get("tasks") {
        return Some(tasks.clone());
    }
    let found = tasks_key().find(&result.summary)?;
    // Start at the `[` and parse exactly one JSON value from there.
    let start = found.end() - 1;
    serde_json::Deserializer::from_str(&result.summary[start..])
        .into_iter::<Value>()
        .next()?
        .ok()
}

fn planned_tasks(result: &AgentResult) -> Option<Vec<PlannedTask>> {
    let value = tasks_value(result)?;
    match serde_json::from_value::<Vec<PlannedTask>>(value) {
        Ok(tasks) => Some(tasks),
        Err(e) => {
            debug!(error = %e, "Planned task list did not parse");
            None
        }
    }
}

fn dependency_ref(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Build the task list for `session` from the architect's result.
///
/// Ids come from the session counter. Dependencies naming a planned `id`, or
/// an index as `task_<i>` or `<i>`, are rewritten to the generated ids; any
/// other reference is kept and never resolves. An unusable list (missing,
/// malformed, empty or naming an unknown agent) yields [`fallback_plan`].
pub fn build_plan(result: &AgentResult, session: &mut SwarmSession) -> Vec<Task> {
    let Some(planned) = planned_tasks(result).filter(|p| !p.is_empty()) else {
        warn!("Architect returned no usable task list, using the default plan");
        return fallback_plan(session);
    };

    let mut kinds = Vec::with_capacity(planned.len());
    for entry in &planned {
        match entry.agent.parse::<AgentKind>() {
            Ok(kind) => kinds.push(kind),
            Err(_) => {
                warn!(agent = %entry.agent, "Plan names an unknown agent, using the default plan");
                return fallback_plan(session);
            }
        }
    }

    let ids: Vec<String> = planned.iter().map(|_| session.next_task_id()).collect();
    let mut aliases: HashMap<String, String> = HashMap::new();
    for (index, id) in ids.iter().enumerate() {
        aliases.insert(format!("task_{index}"), id.clone());
        aliases.insert(index.to_string(), id.clone());
    }
    for (entry, id) in planned.iter().zip(&ids) {
        if let Some(planned_id) = &entry.id {
            aliases.insert(planned_id.clone(), id.clone());
        }
    }

    planned
        .into_iter()
        .zip(kinds)
        .zip(ids)
        .map(|((entry, kind), id)| {
            let depends_on = entry
                .depends_on
                .unwrap_or_default()
                .iter()
                .filter_map(dependency_ref)
                .map(|dep| aliases.get(&dep).cloned().unwrap_or(dep))
                .collect();
            Task::new(id, kind, entry.task)
                .with_context_files(entry.context_files.unwrap_or_default())
                .with_dependencies(depends_on)
        })
        .collect()
}

/// Implement, then security, review and tests, each depending on the
/// implementation task.
pub fn fallback_plan(session: &mut SwarmSession) -> Vec<Task> {
    let implement = session.next_task_id();
    let feature = session.feature_description.clone();
    let mut tasks = vec![Task::new(
        implement.clone(),
        AgentKind::Coder,
        format!("Implement: {feature}"),
    )];
    for (kind, description) in [
        (AgentKind::Security, "Security review"),
        (AgentKind::Reviewer, "Code review"),
        (AgentKind::Tester, "Write tests"),
    ] {
        tasks.push(
            Task::new(session.next_task_id(), kind, description)
                .with_dependencies(vec![implement.clone()]),
        );
    }
    tasks
}
