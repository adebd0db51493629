//! Session state for the swarm orchestrator.
//!
//! A [`SwarmSession`] is the aggregate root of one feature request: it owns the
//! [`TaskGraph`], the rolling digest history and the blocker list, and is
//! persisted in full after every mutation through a [`SessionStore`].

/// Task records and the dependency graph.
pub mod graph;
/// The session aggregate.
pub mod session;
/// Durable session storage.
pub mod store;

pub use graph::{Task, TaskGraph};
pub use session::{SessionReport, SessionStatus, SwarmSession, DEFAULT_SUMMARY_CAP};
pub use store::{
    validate_session_id, FileSessionStore, InMemorySessionStore, SessionStore, SessionSummary,
};
