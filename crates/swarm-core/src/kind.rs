use crate::SwarmError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Role of each worker in the swarm.
///
/// Purely a tag: scheduling never branches on it, it only selects the worker
/// definition and per-kind configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Coordinates the other workers.
    Orchestrator,
    /// Writes implementation code.
    Coder,
    /// Reviews code for quality and correctness.
    Reviewer,
    /// Audits changes and may block them.
    Security,
    /// Writes and runs tests.
    Tester,
    /// Writes documentation.
    Docs,
    /// Plans features and breaks them into tasks.
    Architect,
    /// Restructures existing code.
    Refactor,
    /// Diagnoses and fixes bugs.
    Debugger,
    /// Mobile UI specialist.
    MobileUi,
    /// Mobile performance specialist.
    MobilePerf,
    /// AWS specialist.
    Aws,
    /// Infrastructure specialist.
    Infra,
}

impl AgentKind {
    /// Every kind, in declaration order.
    pub const ALL: [AgentKind; 13] = [
        AgentKind::Orchestrator,
        AgentKind::Coder,
        AgentKind::Reviewer,
        AgentKind::Security,
        AgentKind::Tester,
        AgentKind::Docs,
        AgentKind::Architect,
        AgentKind::Refactor,
        AgentKind::Debugger,
        AgentKind::MobileUi,
        AgentKind::MobilePerf,
        AgentKind::Aws,
        AgentKind::Infra,
    ];

    /// Wire name of the kind (`mobile_ui`, `coder`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Orchestrator => "orchestrator",
            AgentKind::Coder => "coder",
            AgentKind::Reviewer => "reviewer",
            AgentKind::Security => "security",
            AgentKind::Tester => "tester",
            AgentKind::Docs => "docs",
            AgentKind::Architect => "architect",
            AgentKind::Refactor => "refactor",
            AgentKind::Debugger => "debugger",
            AgentKind::MobileUi => "mobile_ui",
            AgentKind::MobilePerf => "mobile_perf",
            AgentKind::Aws => "aws",
            AgentKind::Infra => "infra",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        AgentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or_else(|| SwarmError::Agent(format!("Unknown agent kind: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(AgentKind::Coder.to_string(), "coder");
        assert_eq!(AgentKind::MobileUi.to_string(), "mobile_ui");
        assert_eq!(AgentKind::Security.to_string(), "security");
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("coder".parse::<AgentKind>().unwrap(), AgentKind::Coder);
        assert_eq!(" Security ".parse::<AgentKind>().unwrap(), AgentKind::Security);
        assert!("janitor".parse::<AgentKind>().is_err());
    }

    #[test]
    fn test_kind_serde_matches_display() {
        for kind in AgentKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
