//! Agent invocation for the swarm orchestrator.
//!
//! Everything between "run this worker on this task" and a normalized
//! [`AgentResult`](swarm_core::AgentResult) lives here:
//!
//! - [`WorkerDefinition`] / [`WorkerPatch`]: data-driven worker roles and
//!   their optional overrides.
//! - [`profiles`]: default definitions for every [`AgentKind`](swarm_core::AgentKind).
//! - [`prompt`]: the sectioned task prompt handed to a worker.
//! - [`parser`]: turns a worker's raw reply into structured fields.
//! - [`AgentBackend`]: the seam to the external capability, with the
//!   [`ClaudeCliBackend`] implementation.
//! - [`AgentInvoker`]: runs one invocation end to end and never fails.

/// Debug artifacts written per invocation.
pub mod artifacts;
/// The external capability seam.
pub mod backend;
/// `claude` CLI backend.
pub mod claude_cli;
/// One invocation, end to end.
pub mod invoker;
/// Reply parsing.
pub mod parser;
/// Default worker definitions per kind.
pub mod profiles;
/// Prompt construction.
pub mod prompt;
/// Worker definitions and overrides.
pub mod worker;

pub use artifacts::{ArtifactSink, FileArtifactSink, NoopArtifactSink};
pub use backend::{AgentBackend, BackendOutput, BackendRequest, RunMode};
pub use claude_cli::ClaudeCliBackend;
pub use invoker::{AgentInvoker, InvocationRequest};
pub use parser::{parse_reply, ParsedReply, ReplyStatus, StructuredReport};
pub use profiles::{custom_worker, default_worker, DEFAULT_TOOLS};
pub use worker::{WorkerDefinition, WorkerPatch};
