//! Bootstrap sequencer: bring a fresh checkout to a runnable dev stack.
//!
//! Eight steps run once, strictly in order:
//!
//! | Step               | Guard                                      | On failure        |
//! |--------------------|--------------------------------------------|-------------------|
//! | `start-services`   | none                                       | abort the run     |
//! | `env-file`         | file absent                                | warn, continue    |
//! | `wait-for-db`      | none; bounded by the retry policy          | warn, continue    |
//! | `install-backend`  | `requirements.txt` in the backend          | warn, continue    |
//! | `migrate`          | alembic dir, ini, requirement, or command  | warn, continue    |
//! | `install-frontend` | `package.json` in the frontend             | warn, continue    |
//! | `seed`             | `scripts/seed.py` in the backend           | warn, continue    |
//! | `fix-ownership`    | none                                       | ignored           |
//!
//! Completed steps are never rolled back. Each outcome is recorded in a
//! [`BootstrapReport`].

pub mod env_file;
pub mod readiness;
pub mod report;

pub use env_file::{EnvFileAction, ensure_env_file};
pub use readiness::{ReadinessOutcome, wait_until_ready};
pub use report::{BootstrapReport, StepName, StepOutcome, StepRecord};

use crate::config::StackConfig;
use crate::errors::BootstrapError;
use crate::process::{CommandRunner, CommandSpec};
use std::time::Instant;
use tracing::{debug, info};

pub struct Bootstrap<'a> {
    config: &'a StackConfig,
    runner: &'a dyn CommandRunner,
    dry_run: bool,
}

impl<'a> Bootstrap<'a> {
    pub fn new(config: &'a StackConfig, runner: &'a dyn CommandRunner) -> Self {
        Self {
            config,
            runner,
            dry_run: false,
        }
    }

    /// Leave the local filesystem untouched. Pair with a runner that does not
    /// execute anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run every step. Only a failure to start services is returned as an error.
    pub async fn run(&self) -> Result<BootstrapReport, BootstrapError> {
        let mut report = BootstrapReport::start();
        info!(compose = %self.config.compose.command_line(), "bootstrapping dev stack");

        for &step in StepName::all() {
            info!(step = %step, "running");
            let clock = Instant::now();
            let outcome = match step {
                StepName::StartServices => StepOutcome::succeeded(self.start_services().await?),
                StepName::EnvFile => self.ensure_env_file(),
                StepName::WaitForDb => self.wait_for_db().await,
                StepName::InstallBackend => self.install_backend().await,
                StepName::Migrate => self.migrate().await,
                StepName::InstallFrontend => self.install_frontend().await,
                StepName::Seed => self.seed().await,
                StepName::FixOwnership => self.fix_ownership().await,
            };
            report.record(step, outcome, elapsed_ms(clock));
        }

        report.finish();
        Ok(report)
    }

    async fn start_services(&self) -> Result<String, BootstrapError> {
        let spec = self
            .config
            .compose
            .command(["up", "-d"])
            .with_timeout(self.config.command_timeout());
        let output = self.runner.run(&spec).await?;
        if output.success() {
            Ok("services started".to_string())
        } else {
            Err(BootstrapError::StartFailed {
                code: output.code(),
                detail: output.failure_reason(),
            })
        }
    }

    fn ensure_env_file(&self) -> StepOutcome {
        let target = self.config.env_file_path();
        let shown = self.config.bootstrap.env_file.display();
        if self.dry_run {
            return if target.exists() {
                StepOutcome::skipped(format!("{} already exists, left untouched", shown))
            } else {
                StepOutcome::skipped(format!("dry run: would create {}", shown))
            };
        }

        let action = match ensure_env_file(
            &target,
            &self.config.env_template_path(),
            &self.config.services.db,
        ) {
            Ok(action) => action,
            Err(e) => return StepOutcome::failed(format!("{:#}", e)),
        };

        // Key listing is informational; unparseable lines do not fail the step.
        let key_count = match env_file::env_keys(&target) {
            Ok(keys) => {
                debug!(keys = ?keys, "env file keys");
                format!(" ({} keys)", keys.len())
            }
            Err(e) => {
                debug!(error = %format!("{:#}", e), "could not list env file keys");
                String::new()
            }
        };

        match action {
            EnvFileAction::AlreadyPresent => {
                StepOutcome::skipped(format!("{} already exists, left untouched", shown))
            }
            EnvFileAction::CopiedTemplate => StepOutcome::succeeded(format!(
                "created {} from {}{}",
                shown,
                self.config.bootstrap.env_template.display(),
                key_count
            )),
            EnvFileAction::Synthesized => {
                StepOutcome::succeeded(format!("created {} with default values{}", shown, key_count))
            }
        }
    }

    async fn wait_for_db(&self) -> StepOutcome {
        let db = self.config.services.db.as_str();
        let probe = self
            .config
            .compose
            .exec(db)
            .no_tty()
            .run(["pg_isready", "-U", self.config.bootstrap.db_user.as_str()])
            .with_timeout(self.config.command_timeout());

        let outcome = wait_until_ready(self.config.retry_policy(), db, || self.succeeds(&probe)).await;
        let attempts = outcome.attempts();
        if outcome.is_ready() {
            StepOutcome::succeeded(format!(
                "{} ready after {} attempt{}",
                db,
                attempts,
                if attempts == 1 { "" } else { "s" }
            ))
        } else {
            StepOutcome::failed(format!("{} not ready after {} attempts", db, attempts))
        }
    }

    async fn install_backend(&self) -> StepOutcome {
        let backend = self.backend_exec();
        if !self.file_exists(&backend, "requirements.txt").await {
            return StepOutcome::skipped("no requirements.txt in backend");
        }
        self.run_step(
            backend.run(["pip", "install", "-r", "requirements.txt"]),
            "backend dependencies installed",
        )
        .await
    }

    async fn migrate(&self) -> StepOutcome {
        let Some(found) = self.detect_migrations().await else {
            return StepOutcome::skipped("no migration tooling detected");
        };
        debug!(detected = found, "migration tooling");
        self.run_step(
            self.backend_exec().run(["alembic", "upgrade", "head"]),
            "migrations applied",
        )
        .await
    }

    /// First matching signal that alembic is set up in the backend.
    async fn detect_migrations(&self) -> Option<&'static str> {
        let backend = self.backend_exec();
        let checks: [(&'static str, CommandSpec); 4] = [
            ("alembic directory", backend.run(["test", "-d", "alembic"])),
            ("alembic.ini", backend.run(["test", "-f", "alembic.ini"])),
            (
                "alembic in requirements.txt",
                backend.run(["grep", "-qi", "alembic", "requirements.txt"]),
            ),
            (
                "alembic command",
                backend.run(["sh", "-c", "command -v alembic"]),
            ),
        ];
        for (label, spec) in &checks {
            if self.succeeds(spec).await {
                return Some(*label);
            }
        }
        None
    }

    async fn install_frontend(&self) -> StepOutcome {
        let frontend = self.frontend_exec();
        if !self.file_exists(&frontend, "package.json").await {
            return StepOutcome::skipped("no package.json in frontend");
        }
        let (args, detail) = if self.file_exists(&frontend, "package-lock.json").await {
            (["npm", "ci"], "frontend dependencies installed (npm ci)")
        } else {
            (["npm", "install"], "frontend dependencies installed (npm install)")
        };
        self.run_step(frontend.run(args), detail).await
    }

    async fn seed(&self) -> StepOutcome {
        let backend = self.backend_exec();
        if !self.file_exists(&backend, "scripts/seed.py").await {
            return StepOutcome::skipped("no scripts/seed.py in backend");
        }
        self.run_step(
            backend.run(["python", "scripts/seed.py"]),
            "seed data loaded",
        )
        .await
    }

    async fn fix_ownership(&self) -> StepOutcome {
        let settings = &self.config.bootstrap;
        let spec = self
            .config
            .compose
            .exec(self.backend())
            .no_tty()
            .user("root")
            .run([
                "chown",
                "-R",
                settings.owner.as_str(),
                settings.workspace_dir.as_str(),
            ])
            .with_timeout(self.config.command_timeout());
        self.run_step(
            spec,
            &format!("{} owned by {}", settings.workspace_dir, settings.owner),
        )
        .await
    }

    fn backend(&self) -> &'a str {
        self.config.services.backend.as_str()
    }

    fn backend_exec(&self) -> ExecIn<'a> {
        ExecIn {
            config: self.config,
            service: self.backend(),
            workdir: self.config.workdirs.backend.as_str(),
        }
    }

    fn frontend_exec(&self) -> ExecIn<'a> {
        ExecIn {
            config: self.config,
            service: self.config.services.frontend.as_str(),
            workdir: self.config.workdirs.frontend.as_str(),
        }
    }

    async fn file_exists(&self, exec: &ExecIn<'_>, path: &str) -> bool {
        self.succeeds(&exec.run(["test", "-f", path])).await
    }

    async fn succeeds(&self, spec: &CommandSpec) -> bool {
        match self.runner.run(spec).await {
            Ok(output) => output.success(),
            Err(e) => {
                debug!(command = %spec, error = %e, "check could not run");
                false
            }
        }
    }

    async fn run_step(&self, spec: CommandSpec, success: &str) -> StepOutcome {
        match self.runner.run(&spec).await {
            Ok(output) if output.success() => StepOutcome::succeeded(success),
            Ok(output) => StepOutcome::failed(format!("`{}`: {}", spec, output.failure_reason())),
            Err(e) => StepOutcome::failed(e.to_string()),
        }
    }
}

/// `compose exec -T -w <workdir> <service>` with the command timeout.
struct ExecIn<'a> {
    config: &'a StackConfig,
    service: &'a str,
    workdir: &'a str,
}

impl ExecIn<'_> {
    fn run<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config
            .compose
            .exec(self.service)
            .no_tty()
            .workdir(self.workdir)
            .run(args)
            .with_timeout(self.config.command_timeout())
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
}
