use crate::engine::Orchestrator;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use swarm_agent::InvocationRequest;
use swarm_core::{AgentKind, AgentResult, SwarmResult};
use tracing::info;

/// Stages of the fixed pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    /// Writes the change.
    Coder,
    /// Audits the change; may block.
    Security,
    /// Reviews the change.
    Review,
    /// Writes and runs tests.
    Tester,
}

impl PipelineStage {
    /// Stage name as shown in output.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Coder => "coder",
            PipelineStage::Security => "security",
            PipelineStage::Review => "review",
            PipelineStage::Tester => "tester",
        }
    }

    /// Worker kind that runs this stage.
    pub fn kind(&self) -> AgentKind {
        match self {
            PipelineStage::Coder => AgentKind::Coder,
            PipelineStage::Security => AgentKind::Security,
            PipelineStage::Review => AgentKind::Reviewer,
            PipelineStage::Tester => AgentKind::Tester,
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run switches on top of the configured policy.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// File hints for the coder stage.
    pub context_files: Vec<String>,
    /// Skip the security stage.
    pub skip_security: bool,
    /// Skip the review stage.
    pub skip_review: bool,
    /// Skip the tester stage.
    pub skip_tests: bool,
}

/// Results of the stages that actually ran, in stage order.
pub type PipelineResults = BTreeMap<PipelineStage, AgentResult>;

impl Orchestrator {
    /// Run the fixed flow for one ad hoc request:
    /// coder, then security and review (concurrently when configured), then
    /// tester.
    ///
    /// A failed coder stage ends the run. A blocked security stage ends it
    /// before tests when a security pass is required.
    pub async fn run_pipeline(
        &mut self,
        task: &str,
        options: &PipelineOptions,
    ) -> SwarmResult<PipelineResults> {
        let mut results = PipelineResults::new();

        info!(stage = "coder", "Pipeline stage starting");
        let coder = self
            .invoke_agent(AgentKind::Coder, task, &options.context_files, None)
            .await?;
        let coder_ok = coder.success;
        let files: Vec<String> = coder.touched_files().cloned().collect();
        let summary = coder.summary.clone();
        results.insert(PipelineStage::Coder, coder);
        if !coder_ok {
            info!("Coder stage failed, pipeline stopped");
            return Ok(results);
        }

        let review_task = format!("Review these changes:\n{summary}");
        let policy = self.config().orchestrator.clone();
        let mut review_stages = Vec::new();
        if !options.skip_security && self.config().agent_enabled(AgentKind::Security) {
            review_stages.push(PipelineStage::Security);
        }
        if !options.skip_review && self.config().agent_enabled(AgentKind::Reviewer) {
            review_stages.push(PipelineStage::Review);
        }

        if policy.parallel_reviews && review_stages.len() > 1 {
            info!(stages = review_stages.len(), "Running review stages concurrently");
            let reviewed = self.fan_out(&review_stages, &review_task, &files).await;
            // Applied in stage order once both have finished.
            for (stage, result) in review_stages.iter().zip(reviewed) {
                self.record(&result).await?;
                results.insert(*stage, result);
            }
        } else {
            for stage in &review_stages {
                info!(stage = stage.as_str(), "Pipeline stage starting");
                let result = self
                    .invoke_agent(stage.kind(), &review_task, &files, None)
                    .await?;
                results.insert(*stage, result);
            }
        }

        let security_blocked = results
            .get(&PipelineStage::Security)
            .is_some_and(|r| r.blocked);
        if security_blocked && policy.require_security_pass {
            info!("Security stage blocked, skipping tests");
            return Ok(results);
        }

        if policy.require_tests
            && !options.skip_tests
            && self.config().agent_enabled(AgentKind::Tester)
        {
            info!(stage = "tester", "Pipeline stage starting");
            let tests_task = format!("Write tests for these changes:\n{summary}");
            let tester = self
                .invoke_agent(AgentKind::Tester, &tests_task, &files, None)
                .await?;
            results.insert(PipelineStage::Tester, tester);
        }

        Ok(results)
    }

    /// Fork/join over `stages` with the same task and files. Every invocation
    /// sees the same recent activity; none touches the session.
    async fn fan_out(
        &self,
        stages: &[PipelineStage],
        task: &str,
        files: &[String],
    ) -> Vec<AgentResult> {
        let context = self.recent_context(None);
        let workers: Vec<_> = stages
            .iter()
            .map(|stage| self.config().worker_for(stage.kind()))
            .collect();
        let invocations = workers.iter().map(|worker| {
            self.invoker.invoke(InvocationRequest {
                worker,
                task,
                context_files: files,
                additional_context: context.as_deref(),
            })
        });
        join_all(invocations).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let mut stages = vec![
            PipelineStage::Tester,
            PipelineStage::Review,
            PipelineStage::Coder,
            PipelineStage::Security,
        ];
        stages.sort();
        assert_eq!(
            stages,
            vec![
                PipelineStage::Coder,
                PipelineStage::Security,
                PipelineStage::Review,
                PipelineStage::Tester
            ]
        );
    }

    #[test]
    fn test_stage_names_and_kinds() {
        assert_eq!(PipelineStage::Review.to_string(), "review");
        assert_eq!(PipelineStage::Review.kind(), AgentKind::Reviewer);
        assert_eq!(
            serde_json::to_string(&PipelineStage::Tester).unwrap(),
            "\"tester\""
        );
    }
}
