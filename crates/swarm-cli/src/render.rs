//! Plain-text rendering of results, plans and reports.

use std::fmt::Write;
use swarm_agent::WorkerDefinition;
use swarm_core::{AgentResult, Severity};
use swarm_orchestrator::PipelineResults;
use swarm_session::{SessionReport, SessionSummary, Task};

/// Issues listed per result before the rest are elided.
const MAX_LISTED_ISSUES: usize = 5;

fn mark(result: &AgentResult) -> &'static str {
    if result.blocked {
        "BLOCKED"
    } else if result.success {
        "ok"
    } else {
        "FAILED"
    }
}

/// One result: status line, summary, touched files and issues.
pub fn result(label: &str, result: &AgentResult) -> String {
    let mut out = format!("[{label}] {}", mark(result));
    if result.elapsed_ms > 0 {
        let _ = write!(out, " ({:.1}s)", result.elapsed_ms as f64 / 1000.0);
    }
    out.push('\n');

    if !result.summary.trim().is_empty() {
        for line in result.summary.trim().lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
    if let Some(reason) = &result.block_reason {
        let _ = writeln!(out, "  Blocked: {reason}");
    }
    if !result.files_changed.is_empty() {
        let _ = writeln!(out, "  Changed: {}", result.files_changed.join(", "));
    }
    if !result.files_created.is_empty() {
        let _ = writeln!(out, "  Created: {}", result.files_created.join(", "));
    }
    for issue in result.issues.iter().take(MAX_LISTED_ISSUES) {
        let tag = match issue.severity {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Other => "note",
        };
        let _ = write!(out, "  - [{tag}] {}", issue.description);
        if let Some(file) = &issue.file {
            let _ = write!(out, " ({file})");
        }
        out.push('\n');
    }
    if result.issues.len() > MAX_LISTED_ISSUES {
        let _ = writeln!(
            out,
            "  ... {} more issue(s)",
            result.issues.len() - MAX_LISTED_ISSUES
        );
    }
    out
}

pub fn pipeline(results: &PipelineResults) -> String {
    results
        .iter()
        .map(|(stage, r)| result(stage.as_str(), r))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Numbered plan with agents and dependencies.
pub fn plan(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks planned.\n".to_string();
    }
    let mut out = String::from("Plan:\n");
    for task in tasks {
        let _ = write!(
            out,
            "  {} [{}] {}",
            task.id, task.agent_kind, task.description
        );
        if !task.depends_on.is_empty() {
            let _ = write!(out, " (after {})", task.depends_on.join(", "));
        }
        out.push('\n');
    }
    let _ = writeln!(out, "\nTotal: {} task(s)", tasks.len());
    out
}

pub fn report(report: &SessionReport) -> String {
    let mut out = format!(
        "Session: {}\nFeature: {}\nStatus:  {}\n",
        report.session_id, report.feature, report.status
    );
    if report.total > 0 {
        let _ = writeln!(
            out,
            "Tasks:   {} total, {} completed, {} running, {} pending, {} failed, {} blocked",
            report.total,
            report.completed,
            report.running,
            report.pending,
            report.failed,
            report.blocked
        );
    }
    let _ = writeln!(out, "History: {} summaries", report.summaries_count);
    if !report.blockers.is_empty() {
        out.push_str("Blockers:\n");
        for blocker in &report.blockers {
            let _ = writeln!(out, "  - {blocker}");
        }
    }
    out
}

pub fn sessions(sessions: &[SessionSummary]) -> String {
    let mut out = String::new();
    for s in sessions {
        let _ = writeln!(
            out,
            "  {}  {:<9} {}  {}",
            s.session_id,
            s.status.to_string(),
            s.updated_at.format("%Y-%m-%d %H:%M"),
            s.feature
        );
    }
    out
}

/// One line per worker: name, state, turn limit and tools.
pub fn worker(worker: &WorkerDefinition, enabled: bool) -> String {
    let tools = if worker.allowed_tools.is_empty() {
        "(none)".to_string()
    } else {
        worker.allowed_tools.join(",")
    };
    format!(
        "  {:<14} {:<8} turns={:<3} tools={tools}",
        worker.name,
        if enabled { "enabled" } else { "disabled" },
        worker.max_turns
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_core::{AgentKind, Issue};
    use swarm_orchestrator::PipelineStage;
    use swarm_session::SessionStatus;

    #[test]
    fn test_result_lines() {
        let r = AgentResult::success(AgentKind::Coder, "inv", "Added limiter")
            .with_files_changed(vec!["limiter.go".into()])
            .with_issue(Issue::new(Severity::Warning, "No burst limit"))
            .with_elapsed_ms(1500);
        let text = result("coder", &r);
        assert!(text.starts_with("[coder] ok (1.5s)\n"));
        assert!(text.contains("  Added limiter\n"));
        assert!(text.contains("  Changed: limiter.go\n"));
        assert!(text.contains("  - [warning] No burst limit\n"));
    }

    #[test]
    fn test_blocked_result() {
        let r = AgentResult::success(AgentKind::Security, "inv", "Audit")
            .with_blocked("hardcoded secret found");
        let text = result("security", &r);
        assert!(text.starts_with("[security] BLOCKED\n"));
        assert!(text.contains("Blocked: hardcoded secret found"));
    }

    #[test]
    fn test_issue_list_is_elided() {
        let mut r = AgentResult::failure(AgentKind::Reviewer, "inv", "Many problems");
        for i in 0..8 {
            r = r.with_issue(Issue::new(Severity::Info, format!("issue {i}")));
        }
        let text = result("review", &r);
        assert!(text.contains("issue 4"));
        assert!(!text.contains("issue 5"));
        assert!(text.contains("... 3 more issue(s)"));
    }

    #[test]
    fn test_pipeline_in_stage_order() {
        let mut results = PipelineResults::new();
        results.insert(
            PipelineStage::Tester,
            AgentResult::success(AgentKind::Tester, "b", "tests"),
        );
        results.insert(
            PipelineStage::Coder,
            AgentResult::success(AgentKind::Coder, "a", "code"),
        );
        let text = pipeline(&results);
        assert!(text.find("[coder]").unwrap() < text.find("[tester]").unwrap());
    }

    #[test]
    fn test_plan_listing() {
        let tasks = vec![
            Task::new("task_001", AgentKind::Coder, "Implement"),
            Task::new("task_002", AgentKind::Tester, "Test")
                .with_dependencies(vec!["task_001".into()]),
        ];
        let text = plan(&tasks);
        assert!(text.contains("  task_001 [coder] Implement\n"));
        assert!(text.contains("  task_002 [tester] Test (after task_001)\n"));
        assert!(text.ends_with("Total: 2 task(s)\n"));
        assert_eq!(plan(&[]), "No tasks planned.\n");
    }

    #[test]
    fn test_report() {
        let r = SessionReport {
            session_id: "20260101_120000_abcd".into(),
            feature: "add rate limiting".into(),
            status: SessionStatus::Blocked,
            total: 2,
            completed: 1,
            failed: 0,
            blocked: 1,
            running: 0,
            pending: 0,
            blockers: vec!["security: hardcoded secret found".into()],
            summaries_count: 2,
        };
        let text = report(&r);
        assert!(text.contains("Status:  blocked\n"));
        assert!(text.contains("2 total, 1 completed"));
        assert!(text.contains("  - security: hardcoded secret found\n"));
    }

    #[test]
    fn test_worker_line() {
        let w = swarm_agent::default_worker(AgentKind::Reviewer);
        let line = worker(&w, false);
        assert!(line.contains("disabled"));
        assert!(line.contains("turns=10"));
    }
}
