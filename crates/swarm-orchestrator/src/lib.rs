//! Orchestration for the agent swarm.
//!
//! The [`Orchestrator`] owns the current session and is the only writer of
//! it. Every agent call goes through its gateway, which hands the worker the
//! session's recent activity, folds the result's digest back into the history
//! and persists the session before returning.
//!
//! Two executors sit on top of the gateway:
//!
//! - [`Orchestrator::run_pipeline`]: the fixed coder / security + review /
//!   tester flow for one ad hoc request.
//! - [`Orchestrator::plan_feature`] and [`Orchestrator::execute_plan`]: an
//!   architect-generated task graph walked one linear pass per call.

/// `.swarm.toml` loading and workspace setup.
pub mod config;
/// Session lifecycle and the agent invocation gateway.
pub mod engine;
/// Plan execution.
pub mod plan;
/// Architect reply to task graph.
pub mod planner;
/// The fixed pipeline.
pub mod pipeline;

pub use config::{
    init_config, load_config, AgentSettings, CustomAgentConfig, OrchestratorConfig, SwarmConfig,
    CONFIG_FILE,
};
pub use engine::Orchestrator;
pub use pipeline::{PipelineOptions, PipelineResults, PipelineStage};
pub use planner::{build_plan, fallback_plan};
