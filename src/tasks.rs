//! Task dispatcher: named shortcuts over the compose tool.
//!
//! Every task expands to a fixed *plan*, an ordered list of argument vectors.
//! Planning is pure: it validates parameters and builds commands, it never
//! spawns anything. [`run_plan`] executes a plan in order and stops at the
//! first non-zero exit.

use crate::config::StackConfig;
use crate::errors::{ProcessError, TaskError};
use crate::process::{CommandRunner, CommandSpec};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Up,
    UpDetached,
    Down,
    Rebuild,
    Logs,
    Ps,
    Exec,
    Shell,
    InstallBackend,
    InstallFrontend,
    Migrate,
    Seed,
    Test,
    Fmt,
    BackendUp,
    FrontendUp,
    DbUp,
    PruneVolumes,
    CleanImages,
}

/// Operator-supplied task parameters (`SERVICE`, `CMD`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskParams {
    pub service: Option<String>,
    pub cmd: Option<String>,
}

impl Task {
    /// Returns all tasks in listing order.
    pub fn all() -> &'static [Task] {
        &[
            Task::Up,
            Task::UpDetached,
            Task::Down,
            Task::Rebuild,
            Task::Logs,
            Task::Ps,
            Task::Exec,
            Task::Shell,
            Task::InstallBackend,
            Task::InstallFrontend,
            Task::Migrate,
            Task::Seed,
            Task::Test,
            Task::Fmt,
            Task::BackendUp,
            Task::FrontendUp,
            Task::DbUp,
            Task::PruneVolumes,
            Task::CleanImages,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Task::Up => "up",
            Task::UpDetached => "up-detached",
            Task::Down => "down",
            Task::Rebuild => "rebuild",
            Task::Logs => "logs",
            Task::Ps => "ps",
            Task::Exec => "exec",
            Task::Shell => "shell",
            Task::InstallBackend => "install-backend",
            Task::InstallFrontend => "install-frontend",
            Task::Migrate => "migrate",
            Task::Seed => "seed",
            Task::Test => "test",
            Task::Fmt => "fmt",
            Task::BackendUp => "backend-up",
            Task::FrontendUp => "frontend-up",
            Task::DbUp => "db-up",
            Task::PruneVolumes => "prune-volumes",
            Task::CleanImages => "clean-images",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Task::Up => "Start all services in the foreground",
            Task::UpDetached => "Start all services in the background",
            Task::Down => "Stop and remove containers",
            Task::Rebuild => "Rebuild images without cache and recreate containers",
            Task::Logs => "Follow logs (optionally for one SERVICE)",
            Task::Ps => "List containers",
            Task::Exec => "Run CMD inside SERVICE",
            Task::Shell => "Open a shell inside SERVICE",
            Task::InstallBackend => "pip install -r requirements.txt in the backend",
            Task::InstallFrontend => "npm install in the frontend",
            Task::Migrate => "alembic upgrade head in the backend",
            Task::Seed => "Run scripts/seed.py in the backend",
            Task::Test => "Run pytest in the backend",
            Task::Fmt => "Format backend (black) and frontend (npm run format)",
            Task::BackendUp => "Start only the backend service",
            Task::FrontendUp => "Start only the frontend service",
            Task::DbUp => "Start only the database service",
            Task::PruneVolumes => "Stop containers and delete named volumes",
            Task::CleanImages => "Stop containers and remove locally built images",
        }
    }

    pub fn usage(&self) -> &'static str {
        match self {
            Task::Exec => "stackctl exec --service <SERVICE> --cmd <CMD>  (or SERVICE=... CMD=... stackctl exec)",
            Task::Shell => "stackctl shell --service <SERVICE>  (or SERVICE=... stackctl shell)",
            Task::Logs => "stackctl logs [--service <SERVICE>]",
            _ => "stackctl <task>",
        }
    }

    /// Tasks that delete data and want confirmation.
    pub fn is_destructive(&self) -> bool {
        matches!(self, Task::PruneVolumes)
    }

    /// Check required parameters without touching configuration.
    pub fn check_params(&self, params: &TaskParams) -> Result<(), TaskError> {
        match self {
            Task::Exec => {
                self.require("SERVICE", params.service.as_deref())?;
                self.require("CMD", params.cmd.as_deref())?;
            }
            Task::Shell => {
                self.require("SERVICE", params.service.as_deref())?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Expand the task into its command plan.
    ///
    /// Fails with [`TaskError::MissingParameter`] when a required parameter is
    /// absent or blank; in that case nothing has been, or will be, run.
    pub fn plan(&self, config: &StackConfig, params: &TaskParams) -> Result<Vec<CommandSpec>, TaskError> {
        let compose = &config.compose;
        let backend = config.services.backend.as_str();
        let frontend = config.services.frontend.as_str();
        let db = config.services.db.as_str();
        let backend_wd = config.workdirs.backend.as_str();
        let frontend_wd = config.workdirs.frontend.as_str();

        let plan = match self {
            Task::Up => vec![compose.command(["up"])],
            Task::UpDetached => vec![compose.command(["up", "-d"])],
            Task::Down => vec![compose.command(["down"])],
            Task::Rebuild => vec![
                compose.command(["build", "--no-cache"]),
                compose.command(["up", "-d", "--force-recreate"]),
            ],
            Task::Logs => {
                let mut spec = compose.command(["logs", "-f"]);
                if let Some(service) = present(params.service.as_deref()) {
                    spec = spec.arg(service);
                }
                vec![spec]
            }
            Task::Ps => vec![compose.command(["ps"])],
            Task::Exec => {
                let service = self.require("SERVICE", params.service.as_deref())?;
                let cmd = self.require("CMD", params.cmd.as_deref())?;
                vec![compose.exec(service).run(["sh", "-c", cmd])]
            }
            Task::Shell => {
                let service = self.require("SERVICE", params.service.as_deref())?;
                vec![compose.exec(service).run(["sh"])]
            }
            Task::InstallBackend => vec![
                compose
                    .exec(backend)
                    .workdir(backend_wd)
                    .run(["pip", "install", "-r", "requirements.txt"]),
            ],
            Task::InstallFrontend => vec![
                compose
                    .exec(frontend)
                    .workdir(frontend_wd)
                    .run(["npm", "install"]),
            ],
            Task::Migrate => vec![
                compose
                    .exec(backend)
                    .workdir(backend_wd)
                    .run(["alembic", "upgrade", "head"]),
            ],
            Task::Seed => vec![
                compose
                    .exec(backend)
                    .workdir(backend_wd)
                    .run(["python", "scripts/seed.py"]),
            ],
            Task::Test => vec![compose.exec(backend).workdir(backend_wd).run(["pytest"])],
            Task::Fmt => vec![
                compose.exec(backend).workdir(backend_wd).run(["black", "."]),
                compose
                    .exec(frontend)
                    .workdir(frontend_wd)
                    .run(["npm", "run", "format"]),
            ],
            Task::BackendUp => vec![compose.command(["up", "-d", backend])],
            Task::FrontendUp => vec![compose.command(["up", "-d", frontend])],
            Task::DbUp => vec![compose.command(["up", "-d", db])],
            Task::PruneVolumes => vec![compose.command(["down", "-v"])],
            Task::CleanImages => vec![compose.command(["down", "--rmi", "local"])],
        };

        Ok(plan.into_iter().map(CommandSpec::inherit).collect())
    }

    fn require<'a>(&self, param: &'static str, value: Option<&'a str>) -> Result<&'a str, TaskError> {
        present(value).ok_or(TaskError::MissingParameter {
            task: self.name(),
            param,
            usage: self.usage(),
        })
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Task {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Task::all()
            .iter()
            .copied()
            .find(|task| task.name() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown task '{}'. Run 'stackctl tasks' to list tasks", s))
    }
}

/// Run a plan in order. Returns the exit code of the first failing command, or 0.
pub async fn run_plan(runner: &dyn CommandRunner, plan: &[CommandSpec]) -> Result<i32, ProcessError> {
    for spec in plan {
        debug!(command = %spec, "running task command");
        let output = runner.run(spec).await?;
        if !output.success() {
            return Ok(output.code());
        }
    }
    Ok(0)
}
