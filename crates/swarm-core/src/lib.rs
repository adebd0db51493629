//! Core types and error definitions for the swarm orchestrator.
//!
//! This crate provides the foundational types shared across all swarm crates:
//! the error enum, the closed set of worker roles, the task lifecycle states
//! and the immutable shape of a finished unit of work.
//!
//! # Main types
//!
//! - [`SwarmError`]: Unified error enum for all swarm subsystems.
//! - [`SwarmResult`]: Convenience alias for `Result<T, SwarmError>`.
//! - [`AgentKind`]: Worker role tag (coder, reviewer, security, ...).
//! - [`TaskStatus`]: Lifecycle state of a scheduled task.
//! - [`AgentResult`]: Structured outcome of one agent invocation.
//! - [`Issue`]: A finding reported by an agent, tagged with a [`Severity`].

/// Worker role tags.
pub mod kind;
/// Agent results, issues and the one-line digest.
pub mod result;
/// Task lifecycle states.
pub mod status;
/// Char-boundary safe string clipping.
pub mod text;

pub use kind::AgentKind;
pub use result::{AgentResult, Issue, Severity, DIGEST_SEPARATOR};
pub use status::TaskStatus;

// --- Error types ---

/// Top-level error type for the swarm orchestrator.
///
/// Each variant corresponds to a subsystem that can produce errors. Failures of
/// the external agent capability are *not* errors: they are reported as an
/// [`AgentResult`] with `success == false`.
#[derive(Debug, thiserror::Error)]
pub enum SwarmError {
    /// An error raised while preparing or dispatching an agent invocation.
    #[error("Agent error: {0}")]
    Agent(String),

    /// An error related to session persistence or lookup.
    #[error("Session error: {0}")]
    Session(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A plan could not be built or executed.
    #[error("Plan error: {0}")]
    Plan(String),

    /// An error from the orchestrator control flow.
    #[error("Orchestrator error: {0}")]
    Orchestrator(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`SwarmError`].
pub type SwarmResult<T> = Result<T, SwarmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SwarmError::Session("missing state file".to_string());
        assert_eq!(err.to_string(), "Session error: missing state file");
    }

    #[test]
    fn test_io_error_conversion() {
        fn fails() -> SwarmResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, SwarmError::Io(_)));
    }
}
