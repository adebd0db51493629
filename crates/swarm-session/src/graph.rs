use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use swarm_core::{AgentKind, AgentResult, TaskStatus};

/// A task in the session's plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique within the session (`task_001`, ...).
    pub id: String,
    /// Role that runs the task.
    pub agent_kind: AgentKind,
    /// Instructions handed to the agent.
    pub description: String,
    /// File hints handed to the agent.
    #[serde(default)]
    pub context_files: Vec<String>,
    /// Ids of tasks that must be completed first. Dangling ids never resolve.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Lifecycle state.
    pub status: TaskStatus,
    /// Outcome of the last run, once there is one.
    #[serde(default)]
    pub result: Option<AgentResult>,
}

impl Task {
    /// A pending task with no dependencies.
    pub fn new(id: impl Into<String>, agent_kind: AgentKind, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            agent_kind,
            description: description.into(),
            context_files: Vec::new(),
            depends_on: Vec::new(),
            status: TaskStatus::Pending,
            result: None,
        }
    }

    /// Set the ids that must complete first.
    pub fn with_dependencies(mut self, deps: Vec<String>) -> Self {
        self.depends_on = deps;
        self
    }

    /// Set the file hints.
    pub fn with_context_files(mut self, files: Vec<String>) -> Self {
        self.context_files = files;
        self
    }

    /// Attach a result and derive the final status from it.
    ///
    /// A blocked result always yields [`TaskStatus::Blocked`], whatever its
    /// success flag says.
    pub fn attach_result(&mut self, result: AgentResult) {
        self.status = if result.blocked {
            TaskStatus::Blocked
        } else if result.success {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        };
        self.result = Some(result);
    }
}

/// Ordered task list of a session, with dependency resolution.
///
/// Order is insertion order and is the order the plan executor walks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskGraph {
    tasks: Vec<Task>,
}

impl TaskGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task.
    pub fn push(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the graph has no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    /// Tasks in insertion order, as a slice.
    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    /// Task by id.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Task by id, mutably.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Whether every dependency of `task` names another task that is completed.
    pub fn deps_met(&self, task: &Task) -> bool {
        task.depends_on.iter().all(|dep| {
            self.tasks
                .iter()
                .any(|t| t.id == *dep && t.id != task.id && t.status == TaskStatus::Completed)
        })
    }

    /// Files changed or created by every completed task, deduplicated in graph order.
    pub fn completed_files(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .filter_map(|t| t.result.as_ref())
            .flat_map(|r| r.touched_files())
            .filter(|f| seen.insert(*f))
            .cloned()
            .collect()
    }

    /// Context files for a task: its own hints followed by everything the
    /// completed tasks touched, without duplicates.
    pub fn context_files_for(&self, task: &Task) -> Vec<String> {
        let mut files: Vec<String> = Vec::new();
        for file in task.context_files.iter().cloned().chain(self.completed_files()) {
            if !files.contains(&file) {
                files.push(file);
            }
        }
        files
    }

    /// Number of tasks in the given status.
    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    /// True when every task has a result attached.
    pub fn is_resolved(&self) -> bool {
        self.tasks.iter().all(|t| t.status.is_terminal())
    }

    /// Check for cycles in the dependency graph.
    /// Dangling ids are ignored. Returns true if a cycle is detected.
    pub fn has_cycle(&self) -> bool {
        let mut visited = HashMap::new();
        self.tasks
            .iter()
            .any(|t| self.dfs_cycle(&t.id, &mut visited))
    }

    fn dfs_cycle<'a>(&'a self, id: &'a str, visited: &mut HashMap<&'a str, u8>) -> bool {
        match visited.get(id) {
            Some(1) => return true,  // back edge = cycle
            Some(2) => return false, // already processed
            _ => {}
        }
        visited.insert(id, 1);
        if let Some(task) = self.get(id) {
            for dep in &task.depends_on {
                if self.dfs_cycle(dep, visited) {
                    return true;
                }
            }
        }
        visited.insert(id, 2);
        false
    }
}

impl From<Vec<Task>> for TaskGraph {
    fn from(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }
}

impl<'a> IntoIterator for &'a TaskGraph {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(id: &str, kind: AgentKind, changed: &[&str]) -> Task {
        let mut task = Task::new(id, kind, "done");
        task.attach_result(
            AgentResult::success(kind, "inv", "ok")
                .with_files_changed(changed.iter().map(|s| s.to_string()).collect()),
        );
        task
    }

    #[test]
    fn test_task_creation() {
        let task = Task::new("task_001", AgentKind::Coder, "Implement auth module");
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.depends_on.is_empty());
        assert!(task.result.is_none());
    }

    #[test]
    fn test_attach_result_blocked_overrides_success() {
        let mut task = Task::new("task_002", AgentKind::Security, "audit");
        let mut result = AgentResult::success(AgentKind::Security, "inv", "audit");
        // Bypass normalization to model a self-reported block on a successful run.
        result.blocked = true;
        result.block_reason = Some("hardcoded secret found".into());
        task.attach_result(result);
        assert_eq!(task.status, TaskStatus::Blocked);
    }

    #[test]
    fn test_attach_result_failed() {
        let mut task = Task::new("task_003", AgentKind::Tester, "tests");
        task.attach_result(AgentResult::failure(AgentKind::Tester, "inv", "timed out"));
        assert_eq!(task.status, TaskStatus::Failed);
    }

    #[test]
    fn test_deps_met() {
        let mut graph = TaskGraph::new();
        graph.push(completed("t1", AgentKind::Coder, &["a.rs"]));
        graph.push(Task::new("t2", AgentKind::Tester, "test").with_dependencies(vec!["t1".into()]));
        graph.push(Task::new("t3", AgentKind::Docs, "docs").with_dependencies(vec!["t2".into()]));

        assert!(graph.deps_met(graph.get("t2").unwrap()));
        assert!(!graph.deps_met(graph.get("t3").unwrap()));
    }

    #[test]
    fn test_dangling_dependency_never_met() {
        let mut graph = TaskGraph::new();
        graph.push(completed("t1", AgentKind::Coder, &[]));
        graph.push(Task::new("t2", AgentKind::Tester, "x").with_dependencies(vec!["ghost".into()]));
        assert!(!graph.deps_met(graph.get("t2").unwrap()));
    }

    #[test]
    fn test_self_dependency_never_met() {
        let mut graph = TaskGraph::new();
        graph.push(Task::new("t1", AgentKind::Coder, "x").with_dependencies(vec!["t1".into()]));
        assert!(!graph.deps_met(graph.get("t1").unwrap()));
    }

    #[test]
    fn test_context_files_union() {
        let mut graph = TaskGraph::new();
        graph.push(completed("t1", AgentKind::Coder, &["limiter.go", "shared.go"]));
        graph.push(completed("t2", AgentKind::Coder, &["shared.go", "b.go"]));
        let pending = Task::new("t3", AgentKind::Tester, "test")
            .with_context_files(vec!["hint.go".into(), "b.go".into()]);
        graph.push(pending.clone());

        assert_eq!(
            graph.context_files_for(&pending),
            vec!["hint.go", "b.go", "limiter.go", "shared.go"]
        );
    }

    #[test]
    fn test_failed_task_files_not_in_context() {
        let mut graph = TaskGraph::new();
        let mut failed = Task::new("t1", AgentKind::Coder, "x");
        failed.attach_result(
            AgentResult::failure(AgentKind::Coder, "inv", "no")
                .with_files_changed(vec!["broken.rs".into()]),
        );
        graph.push(failed);
        assert!(graph.completed_files().is_empty());
    }

    #[test]
    fn test_no_cycle() {
        let mut graph = TaskGraph::new();
        graph.push(Task::new("a", AgentKind::Coder, "A"));
        graph.push(Task::new("b", AgentKind::Tester, "B").with_dependencies(vec!["a".into()]));
        graph.push(Task::new("c", AgentKind::Docs, "C").with_dependencies(vec!["missing".into()]));
        assert!(!graph.has_cycle());
    }

    #[test]
    fn test_cycle_detection() {
        let mut graph = TaskGraph::new();
        graph.push(Task::new("a", AgentKind::Coder, "A").with_dependencies(vec!["b".into()]));
        graph.push(Task::new("b", AgentKind::Tester, "B").with_dependencies(vec!["a".into()]));
        assert!(graph.has_cycle());
    }

    #[test]
    fn test_is_resolved() {
        let mut graph = TaskGraph::new();
        assert!(graph.is_resolved());
        graph.push(completed("t1", AgentKind::Coder, &[]));
        assert!(graph.is_resolved());
        graph.push(Task::new("t2", AgentKind::Tester, "x"));
        assert!(!graph.is_resolved());
        assert_eq!(graph.count(TaskStatus::Pending), 1);
    }

    #[test]
    fn test_graph_serializes_as_list() {
        let mut graph = TaskGraph::new();
        graph.push(Task::new("t1", AgentKind::Coder, "x"));
        let json = serde_json::to_value(&graph).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["status"], "pending");
    }
}
