use serde::{Deserialize, Serialize};
use swarm_core::AgentKind;

/// A worker role as plain data: what the external capability is told to be,
/// which tools it may use and how long it may run.
///
/// The gateway dispatches on these fields only; a custom worker built from
/// configuration is just another value of this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerDefinition {
    /// Kind tag recorded on every result this worker produces.
    pub kind: AgentKind,
    /// Display name; the kind name for built-in workers.
    pub name: String,
    /// System instructions.
    pub instructions: String,
    /// Tool allowlist passed to the capability.
    pub allowed_tools: Vec<String>,
    /// Turn limit for one invocation.
    pub max_turns: u32,
    /// Reply format appended to every prompt as `# Output Requirements`.
    pub output_format: String,
}

impl WorkerDefinition {
    /// Return a copy with every field set in `patch` applied.
    ///
    /// Only present fields take effect. A present empty list is applied as an
    /// empty list.
    pub fn patched(&self, patch: &WorkerPatch) -> Self {
        let mut worker = self.clone();
        if let Some(instructions) = &patch.system_prompt_override {
            worker.instructions = instructions.clone();
        }
        if let Some(tools) = &patch.allowed_tools {
            worker.allowed_tools = tools.clone();
        }
        if let Some(max_turns) = patch.max_turns {
            worker.max_turns = max_turns;
        }
        if let Some(extra) = patch.custom_instructions.as_deref() {
            if !extra.trim().is_empty() {
                worker
                    .instructions
                    .push_str(&format!("\n\n## Project Instructions\n{}", extra.trim()));
            }
        }
        worker
    }
}

/// Optional overrides for a [`WorkerDefinition`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerPatch {
    /// Replaces the instructions entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
    /// Replaces the tool list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
    /// Replaces the turn limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<u32>,
    /// Appended to the instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
}

impl WorkerPatch {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.system_prompt_override.is_none()
            && self.allowed_tools.is_none()
            && self.max_turns.is_none()
            && self.custom_instructions.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> WorkerDefinition {
        WorkerDefinition {
            kind: AgentKind::Coder,
            name: "coder".into(),
            instructions: "Write code.".into(),
            allowed_tools: vec!["Read".into(), "Write".into()],
            max_turns: 15,
            output_format: "json".into(),
        }
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let patch = WorkerPatch::default();
        assert!(patch.is_empty());
        assert_eq!(base().patched(&patch), base());
    }

    #[test]
    fn test_patch_applies_present_fields_only() {
        let patch = WorkerPatch {
            max_turns: Some(30),
            ..WorkerPatch::default()
        };
        let worker = base().patched(&patch);
        assert_eq!(worker.max_turns, 30);
        assert_eq!(worker.allowed_tools, vec!["Read", "Write"]);
        assert_eq!(worker.instructions, "Write code.");
    }

    #[test]
    fn test_explicit_empty_tool_list_is_applied() {
        let patch = WorkerPatch {
            allowed_tools: Some(Vec::new()),
            ..WorkerPatch::default()
        };
        assert!(base().patched(&patch).allowed_tools.is_empty());
    }

    #[test]
    fn test_override_then_custom_instructions() {
        let patch = WorkerPatch {
            system_prompt_override: Some("Only write Go.".into()),
            custom_instructions: Some("Use gofmt.".into()),
            ..WorkerPatch::default()
        };
        let worker = base().patched(&patch);
        assert!(worker.instructions.starts_with("Only write Go."));
        assert!(worker
            .instructions
            .ends_with("## Project Instructions\nUse gofmt."));
    }

    #[test]
    fn test_patch_deserializes_partial() {
        let patch: WorkerPatch = serde_json::from_str(r#"{"max_turns": 5}"#).unwrap();
        assert_eq!(patch.max_turns, Some(5));
        assert!(patch.allowed_tools.is_none());
    }
}
