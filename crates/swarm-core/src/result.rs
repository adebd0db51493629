use crate::kind::AgentKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Separator between the fields of an [`AgentResult::digest`] line.
pub const DIGEST_SEPARATOR: &str = " | ";

/// Number of changed paths listed in a digest before it is truncated.
const DIGEST_MAX_PATHS: usize = 3;

/// Reason recorded when an agent reports `blocked` without giving one.
const UNSTATED_BLOCK_REASON: &str = "blocked without a stated reason";

/// Severity tag of an [`Issue`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Will break production.
    Critical,
    /// Should be fixed, does not break functionality.
    Warning,
    /// Improvement suggestion.
    #[default]
    Info,
    /// Any tag the agent invented.
    #[serde(other)]
    Other,
}

/// A finding reported by an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// How serious the finding is.
    #[serde(default)]
    pub severity: Severity,
    /// What is wrong.
    #[serde(default)]
    pub description: String,
    /// File the finding points at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Line within `file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Proposed fix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Issue {
    /// Create an issue with a severity and description.
    pub fn new(severity: Severity, description: impl Into<String>) -> Self {
        Self {
            severity,
            description: description.into(),
            ..Self::default()
        }
    }
}

/// Outcome of a single agent invocation.
///
/// Invariant: `blocked` implies `!success` and a non-empty `block_reason`.
/// Every constructor and [`AgentResult::normalized`] restore it, so scheduling
/// code can trust the flags without re-checking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    /// Role of the worker that produced this result.
    pub agent_kind: AgentKind,
    /// Invocation identifier (`<timestamp>_<hex>`), not the plan task id.
    pub task_id: String,
    /// The invocation finished cleanly and did not block.
    pub success: bool,
    /// Human-readable account of the run.
    pub summary: String,
    /// Existing files the agent modified.
    #[serde(default)]
    pub files_changed: Vec<String>,
    /// Files the agent added.
    #[serde(default)]
    pub files_created: Vec<String>,
    /// Findings, in reported order.
    #[serde(default)]
    pub issues: Vec<Issue>,
    /// Follow-up ideas.
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// The agent refused to let the work proceed.
    #[serde(default)]
    pub blocked: bool,
    /// Why the agent blocked. Present whenever `blocked` is set.
    #[serde(default)]
    pub block_reason: Option<String>,
    /// Only kept for failed invocations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
    /// Wall-clock duration of the invocation.
    #[serde(default)]
    pub elapsed_ms: u64,
    /// Tokens spent, when the capability reports them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    /// Extra keys of the agent's structured reply (`tasks`, `risks`, ...).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl AgentResult {
    /// A successful result with only a summary.
    pub fn success(
        agent_kind: AgentKind,
        task_id: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            agent_kind,
            task_id: task_id.into(),
            success: true,
            summary: summary.into(),
            files_changed: Vec::new(),
            files_created: Vec::new(),
            issues: Vec::new(),
            suggestions: Vec::new(),
            blocked: false,
            block_reason: None,
            raw_output: None,
            elapsed_ms: 0,
            tokens_used: None,
            details: Map::new(),
        }
    }

    /// A failed (but not blocked) result.
    pub fn failure(
        agent_kind: AgentKind,
        task_id: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        let mut result = Self::success(agent_kind, task_id, summary);
        result.success = false;
        result
    }

    /// Set the modified files.
    pub fn with_files_changed(mut self, files: Vec<String>) -> Self {
        self.files_changed = files;
        self
    }

    /// Set the added files.
    pub fn with_files_created(mut self, files: Vec<String>) -> Self {
        self.files_created = files;
        self
    }

    /// Append one issue.
    pub fn with_issue(mut self, issue: Issue) -> Self {
        self.issues.push(issue);
        self
    }

    /// Keep the raw capability output.
    pub fn with_raw_output(mut self, raw: impl Into<String>) -> Self {
        self.raw_output = Some(raw.into());
        self
    }

    /// Set the measured duration.
    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    /// Mark the result as blocked. Clears `success`.
    pub fn with_blocked(mut self, reason: impl Into<String>) -> Self {
        self.blocked = true;
        self.block_reason = Some(reason.into());
        self.normalized()
    }

    /// Restore the blocked/success invariant.
    pub fn normalized(mut self) -> Self {
        if self.blocked {
            self.success = false;
            let missing = self
                .block_reason
                .as_deref()
                .map_or(true, |r| r.trim().is_empty());
            if missing {
                self.block_reason = Some(UNSTATED_BLOCK_REASON.to_string());
            }
        }
        self
    }

    /// Changed then created paths, in report order.
    pub fn touched_files(&self) -> impl Iterator<Item = &String> {
        self.files_changed.iter().chain(self.files_created.iter())
    }

    /// Count of issues with the given severity.
    pub fn issue_count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// One-line digest kept in the session's rolling history.
    ///
    /// `[CODER] ✓ | Changed: a, b, c | (+2 more) | 1 critical | 2 warnings | BLOCKED: reason`
    pub fn digest(&self) -> String {
        let mut parts = vec![
            format!("[{}]", self.agent_kind.as_str().to_uppercase()),
            if self.success { "✓" } else { "✗" }.to_string(),
        ];

        if !self.files_changed.is_empty() {
            let shown: Vec<&str> = self
                .files_changed
                .iter()
                .take(DIGEST_MAX_PATHS)
                .map(String::as_str)
                .collect();
            parts.push(format!("Changed: {}", shown.join(", ")));
            if self.files_changed.len() > DIGEST_MAX_PATHS {
                parts.push(format!(
                    "(+{} more)",
                    self.files_changed.len() - DIGEST_MAX_PATHS
                ));
            }
        }

        let critical = self.issue_count(Severity::Critical);
        let warnings = self.issue_count(Severity::Warning);
        if critical > 0 {
            parts.push(format!("{critical} critical"));
        }
        if warnings > 0 {
            parts.push(format!("{warnings} warnings"));
        }

        if self.blocked {
            parts.push(format!(
                "BLOCKED: {}",
                self.block_reason.as_deref().unwrap_or(UNSTATED_BLOCK_REASON)
            ));
        }

        parts.join(DIGEST_SEPARATOR)
    }
}
