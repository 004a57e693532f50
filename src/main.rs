use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use stackctl::tasks::{Task, TaskParams};

mod cmd;

#[derive(Parser)]
#[command(name = "stackctl")]
#[command(version, about = "Dev-stack task runner and bootstrap sequencer for docker-compose projects")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip confirmation prompts for destructive tasks
    #[arg(long, global = true)]
    pub yes: bool,

    /// Print the commands a task would run instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Log output format: text, json
    #[arg(long, default_value = "text", global = true)]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(flatten)]
    Task(TaskCommands),
    /// First-time setup of the development environment
    Bootstrap {
        /// Readiness probes before giving up (overrides RETRIES)
        #[arg(long)]
        retries: Option<u32>,
        /// Seconds between readiness probes (overrides SLEEP)
        #[arg(long)]
        sleep: Option<u64>,
        /// Exit non-zero if any best-effort step failed
        #[arg(long)]
        strict: bool,
        /// Report format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List available tasks
    Tasks,
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

/// Dispatcher tasks, one subcommand each.
#[derive(Subcommand)]
pub enum TaskCommands {
    /// Start all services in the foreground
    Up,
    /// Start all services in the background
    UpDetached,
    /// Stop and remove containers
    Down,
    /// Rebuild images without cache and recreate containers
    Rebuild,
    /// Follow logs
    Logs {
        #[arg(long, env = "SERVICE")]
        service: Option<String>,
    },
    /// List containers
    Ps,
    /// Run a command inside a service
    Exec {
        #[arg(long, env = "SERVICE")]
        service: Option<String>,
        #[arg(long, env = "CMD")]
        cmd: Option<String>,
    },
    /// Open a shell inside a service
    Shell {
        #[arg(long, env = "SERVICE")]
        service: Option<String>,
    },
    /// Install backend dependencies
    InstallBackend,
    /// Install frontend dependencies
    InstallFrontend,
    /// Run database migrations
    Migrate,
    /// Run the seed script
    Seed,
    /// Run the backend test suite
    Test,
    /// Run formatters
    Fmt,
    /// Start only the backend service
    BackendUp,
    /// Start only the frontend service
    FrontendUp,
    /// Start only the database service
    DbUp,
    /// Stop containers and delete named volumes
    PruneVolumes,
    /// Stop containers and remove locally built images
    CleanImages,
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default stackctl.toml
    Init,
}

impl TaskCommands {
    /// The dispatcher task behind this subcommand.
    fn as_task(&self) -> (Task, TaskParams) {
        let none = TaskParams::default();
        match self {
            TaskCommands::Up => (Task::Up, none),
            TaskCommands::UpDetached => (Task::UpDetached, none),
            TaskCommands::Down => (Task::Down, none),
            TaskCommands::Rebuild => (Task::Rebuild, none),
            TaskCommands::Logs { service } => (
                Task::Logs,
                TaskParams {
                    service: service.clone(),
                    cmd: None,
                },
            ),
            TaskCommands::Ps => (Task::Ps, none),
            TaskCommands::Exec { service, cmd } => (
                Task::Exec,
                TaskParams {
                    service: service.clone(),
                    cmd: cmd.clone(),
                },
            ),
            TaskCommands::Shell { service } => (
                Task::Shell,
                TaskParams {
                    service: service.clone(),
                    cmd: None,
                },
            ),
            TaskCommands::InstallBackend => (Task::InstallBackend, none),
            TaskCommands::InstallFrontend => (Task::InstallFrontend, none),
            TaskCommands::Migrate => (Task::Migrate, none),
            TaskCommands::Seed => (Task::Seed, none),
            TaskCommands::Test => (Task::Test, none),
            TaskCommands::Fmt => (Task::Fmt, none),
            TaskCommands::BackendUp => (Task::BackendUp, none),
            TaskCommands::FrontendUp => (Task::FrontendUp, none),
            TaskCommands::DbUp => (Task::DbUp, none),
            TaskCommands::PruneVolumes => (Task::PruneVolumes, none),
            TaskCommands::CleanImages => (Task::CleanImages, none),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    stackctl::logging::init(cli.verbose, cli.log_format.parse()?)?;

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Task(command) => {
            let (task, params) = command.as_task();
            cmd::cmd_task(&cli, &project_dir, task, &params).await
        }
        Commands::Bootstrap {
            retries,
            sleep,
            strict,
            format,
        } => {
            cmd::cmd_bootstrap(&project_dir, *retries, *sleep, *strict, cli.dry_run, format).await
        }
        Commands::Tasks => {
            cmd::cmd_tasks();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { command } => {
            cmd::cmd_config(&project_dir, command.clone())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
