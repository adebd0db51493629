use crate::graph::{Task, TaskGraph};
use crate::store::SessionSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use swarm_core::text::truncate_chars;
use swarm_core::{AgentResult, TaskStatus};
use uuid::Uuid;

/// Default cap on the rolling digest history.
pub const DEFAULT_SUMMARY_CAP: usize = 20;

/// Digests shown in a [`SwarmSession::briefing`].
const BRIEFING_SUMMARIES: usize = 10;
/// Characters of the architecture narrative shown in a briefing.
const BRIEFING_ARCHITECTURE_CHARS: usize = 500;
/// Characters of the feature text shown in session listings.
const LISTING_FEATURE_CHARS: usize = 50;

/// Coarse lifecycle status of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created, nothing planned yet.
    #[default]
    Active,
    /// A plan is in place.
    Planned,
    /// Every task completed.
    Completed,
    /// A task blocked.
    Blocked,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Planned => write!(f, "planned"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Blocked => write!(f, "blocked"),
        }
    }
}

/// State of the swarm for one feature request.
///
/// Owns its tasks exclusively. Every mutation is followed by a full overwrite
/// of the durable record, so a restored session matches the last write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmSession {
    /// Storage key.
    pub session_id: String,
    /// The feature request as given.
    pub feature_description: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last mutation.
    pub updated_at: DateTime<Utc>,
    /// Coarse lifecycle status.
    #[serde(default)]
    pub status: SessionStatus,
    /// The architect's design notes.
    #[serde(default)]
    pub architecture: Option<String>,
    /// The plan.
    #[serde(default)]
    pub tasks: TaskGraph,
    /// Rolling digest history, oldest first.
    #[serde(default)]
    pub completed_summaries: Vec<String>,
    /// One entry per blocking event, never pruned.
    #[serde(default)]
    pub blockers: Vec<String>,
    /// Last issued task number.
    #[serde(default)]
    pub task_counter: u32,
}

impl SwarmSession {
    /// A fresh active session with a generated id.
    pub fn new(feature_description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: Self::generate_id(now),
            feature_description: feature_description.into(),
            created_at: now,
            updated_at: now,
            status: SessionStatus::Active,
            architecture: None,
            tasks: TaskGraph::new(),
            completed_summaries: Vec::new(),
            blockers: Vec::new(),
            task_counter: 0,
        }
    }

    fn generate_id(now: DateTime<Utc>) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}_{}", now.format("%Y%m%d_%H%M%S"), &suffix[..4])
    }

    /// Issue the next task id (`task_001`, `task_002`, ...).
    ///
    /// The counter lives in the session, so ids stay unique across resumes.
    pub fn next_task_id(&mut self) -> String {
        self.task_counter += 1;
        format!("task_{:03}", self.task_counter)
    }

    /// Stamp `updated_at` with the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Append a digest line, evicting the oldest entries beyond `cap`.
    pub fn push_summary(&mut self, line: String, cap: usize) {
        self.completed_summaries.push(line);
        if self.completed_summaries.len() > cap {
            let excess = self.completed_summaries.len() - cap;
            self.completed_summaries.drain(..excess);
        }
    }

    /// Fold an invocation result into the history and blocker list.
    pub fn record_result(&mut self, result: &AgentResult, cap: usize) {
        self.push_summary(result.digest(), cap);
        if result.blocked {
            self.blockers.push(format!(
                "{}: {}",
                result.agent_kind,
                result.block_reason.as_deref().unwrap_or_default()
            ));
        }
    }

    /// The newest `n` digests, oldest first.
    pub fn recent_summaries(&self, n: usize) -> &[String] {
        let start = self.completed_summaries.len().saturating_sub(n);
        &self.completed_summaries[start..]
    }

    /// Replace the plan.
    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = TaskGraph::from(tasks);
    }

    /// Recompute the coarse status after an executor pass.
    pub fn refresh_status(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        self.status = if self.tasks.count(TaskStatus::Blocked) > 0 {
            SessionStatus::Blocked
        } else if self.tasks.count(TaskStatus::Completed) == self.tasks.len() {
            SessionStatus::Completed
        } else {
            SessionStatus::Active
        };
    }

    /// Task counts and blockers.
    pub fn report(&self) -> SessionReport {
        SessionReport {
            session_id: self.session_id.clone(),
            feature: self.feature_description.clone(),
            status: self.status,
            total: self.tasks.len(),
            completed: self.tasks.count(TaskStatus::Completed),
            failed: self.tasks.count(TaskStatus::Failed),
            blocked: self.tasks.count(TaskStatus::Blocked),
            running: self.tasks.count(TaskStatus::Running),
            pending: self.tasks.count(TaskStatus::Pending),
            blockers: self.blockers.clone(),
            summaries_count: self.completed_summaries.len(),
        }
    }

    /// Listing entry for this session.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            feature: truncate_chars(&self.feature_description, LISTING_FEATURE_CHARS).to_string(),
            status: self.status,
            updated_at: self.updated_at,
        }
    }

    /// Compact context for a coordinating agent: feature, architecture head,
    /// recent digests and blockers.
    pub fn briefing(&self) -> String {
        let mut context = format!(
            "# Current Session\n\nFeature: {}\n\n",
            self.feature_description
        );

        if let Some(architecture) = &self.architecture {
            context.push_str(&format!(
                "## Architecture\n{}\n\n",
                truncate_chars(architecture, BRIEFING_ARCHITECTURE_CHARS)
            ));
        }

        context.push_str("## Recent Activity\n");
        for summary in self.recent_summaries(BRIEFING_SUMMARIES) {
            context.push_str(&format!("- {summary}\n"));
        }

        if !self.blockers.is_empty() {
            context.push_str("\n## Blockers\n");
            for blocker in &self.blockers {
                context.push_str(&format!("- {blocker}\n"));
            }
        }

        context
    }
}

/// Snapshot of a session's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Session id.
    pub session_id: String,
    /// Feature text.
    pub feature: String,
    /// Session status.
    pub status: SessionStatus,
    /// Number of tasks.
    pub total: usize,
    /// Tasks completed.
    pub completed: usize,
    /// Tasks failed.
    pub failed: usize,
    /// Tasks blocked.
    pub blocked: usize,
    /// Tasks running.
    pub running: usize,
    /// Tasks pending.
    pub pending: usize,
    /// Recorded blocking events.
    pub blockers: Vec<String>,
    /// Length of the digest history.
    pub summaries_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_core::AgentKind;

    #[test]
    fn test_new_session() {
        let session = SwarmSession::new("add rate limiting");
        assert_eq!(session.status, SessionStatus::Active);
        assert!(session.tasks.is_empty());
        assert_eq!(session.created_at, session.updated_at);
        // YYYYmmdd_HHMMSS_xxxx
        assert_eq!(session.session_id.len(), 20);
    }

    #[test]
    fn test_task_ids_are_monotonic() {
        let mut session = SwarmSession::new("x");
        assert_eq!(session.next_task_id(), "task_001");
        assert_eq!(session.next_task_id(), "task_002");
        session.task_counter = 41;
        assert_eq!(session.next_task_id(), "task_042");
    }

    #[test]
    fn test_summary_cap_evicts_oldest() {
        let mut session = SwarmSession::new("x");
        for i in 0..25 {
            session.push_summary(format!("line {i}"), DEFAULT_SUMMARY_CAP);
            assert!(session.completed_summaries.len() <= DEFAULT_SUMMARY_CAP);
        }
        assert_eq!(session.completed_summaries.len(), 20);
        assert_eq!(session.completed_summaries[0], "line 5");
        assert_eq!(session.completed_summaries[19], "line 24");
    }

    #[test]
    fn test_record_blocked_result() {
        let mut session = SwarmSession::new("x");
        let result = AgentResult::success(AgentKind::Security, "inv", "audit")
            .with_blocked("hardcoded secret found");
        session.record_result(&result, DEFAULT_SUMMARY_CAP);
        assert_eq!(session.blockers, vec!["security: hardcoded secret found"]);
        assert!(session.completed_summaries[0].contains("BLOCKED: hardcoded secret found"));
    }

    #[test]
    fn test_recent_summaries() {
        let mut session = SwarmSession::new("x");
        assert!(session.recent_summaries(5).is_empty());
        for i in 0..8 {
            session.push_summary(format!("s{i}"), DEFAULT_SUMMARY_CAP);
        }
        assert_eq!(session.recent_summaries(5), ["s3", "s4", "s5", "s6", "s7"]);
        assert_eq!(session.recent_summaries(50).len(), 8);
    }

    #[test]
    fn test_refresh_status() {
        let mut session = SwarmSession::new("x");
        session.status = SessionStatus::Planned;
        let mut t1 = Task::new("task_001", AgentKind::Coder, "a");
        t1.attach_result(AgentResult::success(AgentKind::Coder, "i", "ok"));
        session.set_tasks(vec![t1, Task::new("task_002", AgentKind::Tester, "b")]);

        session.refresh_status();
        assert_eq!(session.status, SessionStatus::Active);

        if let Some(t2) = session.tasks.get_mut("task_002") {
            t2.attach_result(AgentResult::success(AgentKind::Tester, "i", "ok"));
        }
        session.refresh_status();
        assert_eq!(session.status, SessionStatus::Completed);
    }

    #[test]
    fn test_report_counts() {
        let mut session = SwarmSession::new("x");
        let mut done = Task::new("task_001", AgentKind::Coder, "a");
        done.attach_result(AgentResult::success(AgentKind::Coder, "i", "ok"));
        let mut blocked = Task::new("task_002", AgentKind::Security, "b");
        blocked.attach_result(AgentResult::success(AgentKind::Security, "i", "x").with_blocked("nope"));
        session.set_tasks(vec![done, blocked, Task::new("task_003", AgentKind::Tester, "c")]);

        let report = session.report();
        assert_eq!(report.total, 3);
        assert_eq!(report.completed, 1);
        assert_eq!(report.blocked, 1);
        assert_eq!(report.pending, 1);
        assert_eq!(report.failed, 0);
    }

    #[test]
    fn test_briefing_sections() {
        let mut session = SwarmSession::new("OAuth login");
        session.architecture = Some("a".repeat(800));
        session.push_summary("[CODER] ✓".into(), DEFAULT_SUMMARY_CAP);
        session.blockers.push("security: leaked key".into());

        let briefing = session.briefing();
        assert!(briefing.contains("Feature: OAuth login"));
        assert!(briefing.contains(&format!("{}\n", "a".repeat(500))));
        assert!(!briefing.contains(&"a".repeat(501)));
        assert!(briefing.contains("- [CODER] ✓"));
        assert!(briefing.contains("## Blockers\n- security: leaked key"));
    }

    #[test]
    fn test_listing_truncates_feature() {
        let session = SwarmSession::new("f".repeat(80));
        assert_eq!(session.summary().feature.len(), 50);
    }
}
