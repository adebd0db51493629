use serde::{Deserialize, Serialize};

/// Status of a task in the session graph.
///
/// `Pending → Running → {Completed | Failed | Blocked}`. Nothing returns to
/// `Pending`; a task whose dependencies are never met simply stays there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for dependencies or for the next executor pass.
    Pending,
    /// Handed to the gateway; the result has not been attached yet.
    Running,
    /// The attached result succeeded.
    Completed,
    /// The attached result did not succeed.
    Failed,
    /// The attached result reported a blocking condition.
    Blocked,
}

impl TaskStatus {
    /// Whether a result has been attached and the status can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Blocked
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Blocked => write!(f, "blocked"),
        }
    }
}
