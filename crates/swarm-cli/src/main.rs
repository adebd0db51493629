//! `swarm`: run coding agents over a shared, resumable session.

mod render;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use swarm_agent::ClaudeCliBackend;
use swarm_core::AgentKind;
use swarm_orchestrator::{init_config, load_config, Orchestrator, PipelineOptions, SwarmConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "swarm", about = "Swarm: coding agents coordinated over one session")]
struct Cli {
    /// Project root
    #[arg(short, long, default_value = ".", global = true)]
    project: PathBuf,

    /// Agent CLI executable
    #[arg(long, default_value = "claude", global = true)]
    claude_bin: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default .swarm.toml and create the workspace
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
    /// Show the most recent session
    Status,
    /// Run a task through the pipeline or a single agent
    Run {
        task: String,
        /// Context file hint (repeatable)
        #[arg(short = 'c', long = "context")]
        context: Vec<String>,
        /// Run only this agent (built-in kind or custom agent name)
        #[arg(short, long)]
        agent: Option<String>,
        /// Run only the coder
        #[arg(long)]
        no_pipeline: bool,
        #[arg(long)]
        skip_security: bool,
        #[arg(long)]
        skip_review: bool,
        #[arg(long)]
        skip_tests: bool,
        /// Echo agent progress to the terminal
        #[arg(long)]
        observable: bool,
    },
    /// Plan a feature with the architect
    Plan {
        feature: String,
        /// Run one pass over the plan right away
        #[arg(long)]
        execute: bool,
    },
    /// Run one pass over a stored session's plan
    Execute { session_id: String },
    /// List available agents
    Agents,
    /// Show a session's recent summaries
    Summaries {
        /// Session id (defaults to the most recent)
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

async fn open(cli: &Cli, config: SwarmConfig) -> anyhow::Result<Orchestrator> {
    let backend = Arc::new(ClaudeCliBackend::new().with_binary(cli.claude_bin.clone()));
    Orchestrator::open(&cli.project, config, backend)
        .await
        .context("Failed to open the swarm workspace")
}

/// Resume `session_id`, or the most recently updated session.
async fn resume(orch: &mut Orchestrator, session_id: Option<&str>) -> anyhow::Result<bool> {
    let id = match session_id {
        Some(id) => id.to_string(),
        None => match orch.list_sessions().await?.into_iter().next() {
            Some(latest) => latest.session_id,
            None => return Ok(false),
        },
    };
    if !orch.resume_session(&id).await? {
        anyhow::bail!("Session not found: {id}");
    }
    Ok(true)
}

fn single_agent_kind(agent: Option<&str>, no_pipeline: bool) -> Option<Result<AgentKind, String>> {
    match agent {
        Some(name) => Some(name.parse::<AgentKind>().map_err(|_| name.to_string())),
        None if no_pipeline => Some(Ok(AgentKind::Coder)),
        None => None,
    }
}

fn print_report(orch: &Orchestrator) {
    if let Some(report) = orch.status() {
        print!("{}", render::report(&report));
    }
}

async fn run_command(cli: &Cli, project: &Path) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Init { force } => {
            let path = init_config(project, *force).await?;
            println!("Created {}", path.display());
        }
        Commands::Status => {
            let mut orch = open(cli, load_config(project).await?).await?;
            if !resume(&mut orch, None).await? {
                println!("No sessions found. Start one with 'swarm plan' or 'swarm run'.");
                return Ok(());
            }
            print_report(&orch);
            let sessions = orch.list_sessions().await?;
            if sessions.len() > 1 {
                println!("\nOther sessions:");
                print!("{}", render::sessions(&sessions[1..]));
            }
        }
        Commands::Run {
            task,
            context,
            agent,
            no_pipeline,
            skip_security,
            skip_review,
            skip_tests,
            observable,
        } => {
            let mut config = load_config(project).await?;
            config.orchestrator.observable |= *observable;
            let mut orch = open(cli, config).await?;
            let session_id = orch.start_session(task).await?;
            info!(session_id = %session_id, "Running task");

            match single_agent_kind(agent.as_deref(), *no_pipeline) {
                Some(Ok(kind)) => {
                    let result = orch.invoke_agent(kind, task, context, None).await?;
                    print!("{}", render::result(kind.as_str(), &result));
                }
                Some(Err(name)) => {
                    let result = orch.invoke_custom(&name, task, context, None).await?;
                    print!("{}", render::result(&name, &result));
                }
                None => {
                    let options = PipelineOptions {
                        context_files: context.clone(),
                        skip_security: *skip_security,
                        skip_review: *skip_review,
                        skip_tests: *skip_tests,
                    };
                    let results = orch.run_pipeline(task, &options).await?;
                    print!("{}", render::pipeline(&results));
                }
            }
            println!("\nSession: {session_id}");
        }
        Commands::Plan { feature, execute } => {
            let mut orch = open(cli, load_config(project).await?).await?;
            let tasks = orch.plan_feature(feature).await?;
            print!("{}", render::plan(&tasks));
            if tasks.is_empty() {
                anyhow::bail!("The architect did not produce a plan");
            }
            if *execute {
                println!();
                execute_pass(&mut orch).await?;
            } else if let Some(session) = orch.session() {
                println!("Run 'swarm execute {}' to start.", session.session_id);
            }
        }
        Commands::Execute { session_id } => {
            let mut orch = open(cli, load_config(project).await?).await?;
            resume(&mut orch, Some(session_id.as_str())).await?;
            execute_pass(&mut orch).await?;
        }
        Commands::Agents => {
            let config = load_config(project).await?;
            println!("Built-in agents:");
            for kind in AgentKind::ALL {
                let worker = config.worker_for(kind);
                println!("{}", render::worker(&worker, config.agent_enabled(kind)));
            }
            if !config.custom_agents.is_empty() {
                println!("\nCustom agents:");
                for name in config.custom_agents.keys() {
                    if let Some(worker) = config.custom_worker(name) {
                        println!("{}", render::worker(&worker, true));
                    }
                }
            }
        }
        Commands::Summaries { session } => {
            let mut orch = open(cli, load_config(project).await?).await?;
            if !resume(&mut orch, session.as_deref()).await? {
                println!("No sessions found.");
                return Ok(());
            }
            if let Some(session) = orch.session() {
                println!("Session: {}", session.session_id);
                if session.completed_summaries.is_empty() {
                    println!("No summaries yet.");
                }
                for (i, line) in session.completed_summaries.iter().enumerate() {
                    println!("  {:>2}. {line}", i + 1);
                }
            }
        }
        Commands::Config => {
            let config = load_config(project).await?;
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}

async fn execute_pass(orch: &mut Orchestrator) -> anyhow::Result<()> {
    let ran = orch.execute_plan().await?;
    if ran.is_empty() {
        println!("No runnable tasks.");
    }
    for (task_id, result) in &ran {
        print!("{}", render::result(task_id, result));
    }
    println!();
    print_report(orch);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project = cli.project.clone();
    run_command(&cli, &project).await
}
