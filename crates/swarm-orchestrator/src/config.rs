use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use swarm_agent::{custom_worker, default_worker, WorkerDefinition, WorkerPatch};
use swarm_core::{AgentKind, SwarmError, SwarmResult};
use swarm_session::DEFAULT_SUMMARY_CAP;
use tracing::info;

/// Config file name, looked up in the project root.
pub const CONFIG_FILE: &str = ".swarm.toml";

/// Subdirectories of the workspace.
pub const WORKSPACE_SUBDIRS: [&str; 3] = ["state", "tasks", "summaries"];

/// Top-level configuration loaded from `.swarm.toml`.
///
/// Every field has a default, so a missing file or a missing table yields a
/// working configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmConfig {
    /// Workspace directory, relative to the project root unless absolute.
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: PathBuf,
    /// Orchestration policy.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Per-kind settings keyed by kind name (`coder`, `mobile_ui`, ...).
    #[serde(default)]
    pub agents: BTreeMap<String, AgentSettings>,
    /// Project-specific workers keyed by name.
    #[serde(default)]
    pub custom_agents: BTreeMap<String, CustomAgentConfig>,
}

/// Orchestration policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Run security and review concurrently in the pipeline.
    #[serde(default = "yes")]
    pub parallel_reviews: bool,
    /// A blocked security stage stops the pipeline before tests.
    #[serde(default = "yes")]
    pub require_security_pass: bool,
    /// Run the tester stage.
    #[serde(default = "yes")]
    pub require_tests: bool,
    /// Cap on the rolling digest history.
    #[serde(default = "default_summary_cap")]
    pub summary_cap: usize,
    /// Digests handed to each invocation as recent activity.
    #[serde(default = "default_recent_context")]
    pub recent_context: usize,
    /// Hard limit on one invocation.
    #[serde(default = "default_timeout_secs")]
    pub invocation_timeout_secs: u64,
    /// Echo worker progress to the terminal.
    #[serde(default)]
    pub observable: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            parallel_reviews: true,
            require_security_pass: true,
            require_tests: true,
            summary_cap: default_summary_cap(),
            recent_context: default_recent_context(),
            invocation_timeout_secs: default_timeout_secs(),
            observable: false,
        }
    }
}

/// Settings for one built-in kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Whether the kind may run.
    #[serde(default = "yes")]
    pub enabled: bool,
    /// Overrides applied to the default worker.
    #[serde(flatten)]
    pub patch: WorkerPatch,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            patch: WorkerPatch::default(),
        }
    }
}

/// A worker defined entirely in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAgentConfig {
    /// Full instructions of the worker.
    pub system_prompt: String,
    /// Tool list. Defaults to the coder tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
    /// Turn limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<u32>,
}

fn yes() -> bool {
    true
}
fn default_workspace_dir() -> PathBuf {
    PathBuf::from(".swarm")
}
fn default_summary_cap() -> usize {
    DEFAULT_SUMMARY_CAP
}
fn default_recent_context() -> usize {
    5
}
fn default_timeout_secs() -> u64 {
    300
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            workspace_dir: default_workspace_dir(),
            orchestrator: OrchestratorConfig::default(),
            agents: BTreeMap::new(),
            custom_agents: BTreeMap::new(),
        }
    }
}

impl SwarmConfig {
    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> SwarmResult<Self> {
        let config: SwarmConfig = toml::from_str(text)
            .map_err(|e| SwarmError::Config(format!("Invalid {CONFIG_FILE}: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> SwarmResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| SwarmError::Config(format!("Cannot render configuration: {e}")))
    }

    fn validate(&self) -> SwarmResult<()> {
        for name in self.agents.keys() {
            name.parse::<AgentKind>().map_err(|_| {
                SwarmError::Config(format!("Unknown agent kind in [agents]: {name}"))
            })?;
        }
        if self.orchestrator.summary_cap == 0 {
            return Err(SwarmError::Config("summary_cap must be at least 1".into()));
        }
        if self.orchestrator.invocation_timeout_secs == 0 {
            return Err(SwarmError::Config(
                "invocation_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Absolute workspace directory for `project_root`.
    pub fn workspace(&self, project_root: &Path) -> PathBuf {
        if self.workspace_dir.is_absolute() {
            self.workspace_dir.clone()
        } else {
            project_root.join(&self.workspace_dir)
        }
    }

    /// Directory holding one JSON record per session.
    pub fn state_dir(&self, project_root: &Path) -> PathBuf {
        self.workspace(project_root).join("state")
    }

    /// Settings configured for `kind`, if any.
    pub fn agent_settings(&self, kind: AgentKind) -> Option<&AgentSettings> {
        self.agents
            .iter()
            .find(|(name, _)| name.parse::<AgentKind>().ok() == Some(kind))
            .map(|(_, settings)| settings)
    }

    /// Whether `kind` may run. Kinds without settings are enabled.
    pub fn agent_enabled(&self, kind: AgentKind) -> bool {
        self.agent_settings(kind).map_or(true, |s| s.enabled)
    }

    /// The default worker for `kind` with its configured overrides applied.
    pub fn worker_for(&self, kind: AgentKind) -> WorkerDefinition {
        let worker = default_worker(kind);
        match self.agent_settings(kind) {
            Some(settings) => worker.patched(&settings.patch),
            None => worker,
        }
    }

    /// A configured custom worker by name.
    pub fn custom_worker(&self, name: &str) -> Option<WorkerDefinition> {
        self.custom_agents.get(name).map(|c| {
            custom_worker(name, &c.system_prompt, c.allowed_tools.clone(), c.max_turns)
        })
    }

    /// Hard limit on one invocation.
    pub fn invocation_timeout(&self) -> Duration {
        Duration::from_secs(self.orchestrator.invocation_timeout_secs)
    }
}

/// Load `.swarm.toml` from `project_root`.
///
/// A missing file yields the defaults; a malformed one is an error.
pub async fn load_config(project_root: &Path) -> SwarmResult<SwarmConfig> {
    let path = project_root.join(CONFIG_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => {
            let config = SwarmConfig::from_toml(&text)?;
            info!(path = %path.display(), "Loaded configuration");
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SwarmConfig::default()),
        Err(e) => Err(e.into()),
    }
}

const CONFIG_TEMPLATE: &str = r#"# Swarm configuration

# Working directory for session state, prompts and results.
workspace_dir = ".swarm"

[orchestrator]
# Run security and code review concurrently after the coder.
parallel_reviews = true
# Stop before tests when security blocks.
require_security_pass = true
# Run the tester after review.
require_tests = true
# Digests kept in the rolling history.
summary_cap = 20
# Digests handed to each agent as recent activity.
recent_context = 5
# Hard limit on one agent run, in seconds.
invocation_timeout_secs = 300
# Echo agent progress to the terminal.
observable = false

# Per-agent overrides. Only the fields you set take effect.
# [agents.coder]
# max_turns = 20
# custom_instructions = "Use the repository's error types."
#
# [agents.docs]
# enabled = false

# Project-specific agents.
# [custom_agents.migrations]
# system_prompt = "You write reversible SQL migrations."
# allowed_tools = ["Read", "Write", "Edit"]
# max_turns = 10
"#;

/// Write a default `.swarm.toml`, create the workspace tree and ignore the
/// workspace in an existing `.gitignore`.
///
/// Refuses to overwrite an existing config unless `force`.
pub async fn init_config(project_root: &Path, force: bool) -> SwarmResult<PathBuf> {
    let path = project_root.join(CONFIG_FILE);
    if path.exists() && !force {
        return Err(SwarmError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    tokio::fs::write(&path, CONFIG_TEMPLATE).await?;

    let config = SwarmConfig::from_toml(CONFIG_TEMPLATE)?;
    let workspace = config.workspace(project_root);
    for sub in WORKSPACE_SUBDIRS {
        tokio::fs::create_dir_all(workspace.join(sub)).await?;
    }

    let gitignore = project_root.join(".gitignore");
    if gitignore.exists() {
        let entry = format!("{}/", config.workspace_dir.display());
        let contents = tokio::fs::read_to_string(&gitignore).await?;
        if !contents.lines().any(|l| l.trim() == entry) {
            let mut updated = contents;
            if !updated.is_empty() && !updated.ends_with('\n') {
                updated.push('\n');
            }
            updated.push_str(&format!("\n# Swarm workspace\n{entry}\n"));
            tokio::fs::write(&gitignore, updated).await?;
        }
    }

    info!(path = %path.display(), "Initialized configuration");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = SwarmConfig::from_toml("").unwrap();
        assert_eq!(config, SwarmConfig::default());
        assert!(config.orchestrator.parallel_reviews);
        assert_eq!(config.orchestrator.summary_cap, 20);
        assert_eq!(config.orchestrator.recent_context, 5);
        assert_eq!(config.invocation_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_template_matches_defaults() {
        assert_eq!(
            SwarmConfig::from_toml(CONFIG_TEMPLATE).unwrap(),
            SwarmConfig::default()
        );
    }

    #[test]
    fn test_agent_overrides() {
        let config = SwarmConfig::from_toml(
            r#"
[agents.coder]
max_turns = 25
allowed_tools = []

[agents.docs]
enabled = false
"#,
        )
        .unwrap();

        let coder = config.worker_for(AgentKind::Coder);
        assert_eq!(coder.max_turns, 25);
        assert!(coder.allowed_tools.is_empty());
        assert!(!config.agent_enabled(AgentKind::Docs));
        assert!(config.agent_enabled(AgentKind::Tester));
        assert_eq!(config.worker_for(AgentKind::Tester).max_turns, 15);
    }

    #[test]
    fn test_custom_agent() {
        let config = SwarmConfig::from_toml(
            r#"
[custom_agents.migrations]
system_prompt = "Write migrations."
max_turns = 4
"#,
        )
        .unwrap();
        let worker = config.custom_worker("migrations").unwrap();
        assert_eq!(worker.name, "migrations");
        assert_eq!(worker.instructions, "Write migrations.");
        assert_eq!(worker.max_turns, 4);
        assert!(config.custom_worker("nope").is_none());
    }

    #[test]
    fn test_rendered_config_reloads() {
        let config = SwarmConfig::from_toml(
            r#"
[orchestrator]
parallel_reviews = false

[agents.coder]
custom_instructions = "Prefer small diffs."

[custom_agents.migrations]
system_prompt = "Write migrations."
"#,
        )
        .unwrap();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("parallel_reviews = false"));
        assert_eq!(SwarmConfig::from_toml(&rendered).unwrap(), config);
    }

    #[test]
    fn test_malformed_config_is_error() {
        assert!(matches!(
            SwarmConfig::from_toml("orchestrator = 3"),
            Err(SwarmError::Config(_))
        ));
        assert!(matches!(
            SwarmConfig::from_toml("[agents.janitor]\nenabled = true"),
            Err(SwarmError::Config(_))
        ));
        assert!(SwarmConfig::from_toml("[orchestrator]\nsummary_cap = 0").is_err());
    }

    #[test]
    fn test_workspace_resolution() {
        let config = SwarmConfig::default();
        assert_eq!(
            config.state_dir(Path::new("/proj")),
            PathBuf::from("/proj/.swarm/state")
        );
        let abs = SwarmConfig {
            workspace_dir: PathBuf::from("/var/swarm"),
            ..SwarmConfig::default()
        };
        assert_eq!(abs.workspace(Path::new("/proj")), PathBuf::from("/var/swarm"));
    }

    #[tokio::test]
    async fn test_load_missing_config() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(load_config(tmp.path()).await.unwrap(), SwarmConfig::default());
    }

    #[tokio::test]
    async fn test_load_malformed_config() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::write(tmp.path().join(CONFIG_FILE), "[[[").await.unwrap();
        assert!(load_config(tmp.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_init_config() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::write(tmp.path().join(".gitignore"), "target")
            .await
            .unwrap();

        let path = init_config(tmp.path(), false).await.unwrap();
        assert!(path.exists());
        for sub in WORKSPACE_SUBDIRS {
            assert!(tmp.path().join(".swarm").join(sub).is_dir());
        }
        let gitignore = tokio::fs::read_to_string(tmp.path().join(".gitignore"))
            .await
            .unwrap();
        assert_eq!(gitignore, "target\n\n# Swarm workspace\n.swarm/\n");

        assert!(init_config(tmp.path(), false).await.is_err());
        init_config(tmp.path(), true).await.unwrap();
        let gitignore = tokio::fs::read_to_string(tmp.path().join(".gitignore"))
            .await
            .unwrap();
        assert_eq!(gitignore.matches(".swarm/").count(), 1);
        assert_eq!(load_config(tmp.path()).await.unwrap(), SwarmConfig::default());
    }
}
