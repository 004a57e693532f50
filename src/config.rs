//! Layered configuration for stackctl.
//!
//! Values are resolved in three layers, later layers winning:
//! 1. `stackctl.toml` in the project directory (optional)
//! 2. Environment variables (`COMPOSE_CMD`, `BACKEND_SERVICE`, `RETRIES`, ...)
//! 3. CLI flags (`bootstrap --retries/--sleep`)
//!
//! # Configuration File Format
//!
//! ```toml
//! [compose]
//! command = "docker compose"
//!
//! [services]
//! backend = "api"
//! frontend = "web"
//! db = "postgres"
//!
//! [workdirs]
//! backend = "/srv/api"
//! frontend = "/srv/web"
//!
//! [bootstrap]
//! retries = 20
//! sleep_secs = 3
//! env_file = ".env"
//! env_template = ".env.example"
//! db_user = "postgres"
//! owner = "1000:1000"
//! workspace_dir = "/app"
//! command_timeout_secs = 600
//! ```

use crate::compose::Compose;
use crate::errors::ConfigError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the optional project-level config file.
pub const CONFIG_FILE: &str = "stackctl.toml";

/// Compose tool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeSettings {
    /// Compose command line, split on whitespace (default: "docker-compose")
    #[serde(default = "default_compose_command")]
    pub command: String,
}

fn default_compose_command() -> String {
    "docker-compose".to_string()
}

impl Default for ComposeSettings {
    fn default() -> Self {
        Self {
            command: default_compose_command(),
        }
    }
}

/// Service names in the compose file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Services {
    #[serde(default = "default_backend_service")]
    pub backend: String,
    #[serde(default = "default_frontend_service")]
    pub frontend: String,
    #[serde(default = "default_db_service")]
    pub db: String,
}

fn default_backend_service() -> String {
    "backend".to_string()
}

fn default_frontend_service() -> String {
    "frontend".to_string()
}

fn default_db_service() -> String {
    "db".to_string()
}

impl Default for Services {
    fn default() -> Self {
        Self {
            backend: default_backend_service(),
            frontend: default_frontend_service(),
            db: default_db_service(),
        }
    }
}

/// Working directories inside the backend and frontend containers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workdirs {
    #[serde(default = "default_workdir")]
    pub backend: String,
    #[serde(default = "default_workdir")]
    pub frontend: String,
}

fn default_workdir() -> String {
    "/app".to_string()
}

impl Default for Workdirs {
    fn default() -> Self {
        Self {
            backend: default_workdir(),
            frontend: default_workdir(),
        }
    }
}

/// Bootstrap sequencer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapSettings {
    /// Maximum readiness probes before giving up
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Seconds slept after each failed probe
    #[serde(default = "default_sleep_secs")]
    pub sleep_secs: u64,
    /// Env file to create, relative to the project directory
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,
    /// Template copied into `env_file` when present
    #[serde(default = "default_env_template")]
    pub env_template: PathBuf,
    /// Role passed to `pg_isready -U`
    #[serde(default = "default_db_user")]
    pub db_user: String,
    /// `uid:gid` applied to the mounted workspace
    #[serde(default = "default_owner")]
    pub owner: String,
    /// Mounted workspace inside the backend container
    #[serde(default = "default_workdir")]
    pub workspace_dir: String,
    /// Upper bound for each captured bootstrap command
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

fn default_retries() -> u32 {
    12
}

fn default_sleep_secs() -> u64 {
    2
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

fn default_env_template() -> PathBuf {
    PathBuf::from(".env.example")
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_owner() -> String {
    "1000:1000".to_string()
}

fn default_command_timeout_secs() -> u64 {
    600
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            sleep_secs: default_sleep_secs(),
            env_file: default_env_file(),
            env_template: default_env_template(),
            db_user: default_db_user(),
            owner: default_owner(),
            workspace_dir: default_workdir(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

/// The complete stackctl.toml structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StackToml {
    #[serde(default)]
    pub compose: ComposeSettings,
    #[serde(default)]
    pub services: Services,
    #[serde(default)]
    pub workdirs: Workdirs,
    #[serde(default)]
    pub bootstrap: BootstrapSettings,
}

impl StackToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse configuration from a TOML string; `path` is only used in errors.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize stackctl.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// The project's file layer (or defaults) with environment overrides applied.
    /// Also returns the path of the file that was read, if any.
    pub fn effective<F>(project_dir: &Path, lookup: F) -> Result<(Self, Option<PathBuf>), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = project_dir.join(CONFIG_FILE);
        let (mut toml, config_file) = if config_path.exists() {
            (Self::load(&config_path)?, Some(config_path))
        } else {
            (Self::default(), None)
        };
        toml.apply_env(lookup)?;
        Ok((toml, config_file))
    }

    /// Apply environment overrides, reading variables through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = set("COMPOSE_CMD") {
            self.compose.command = v;
        }
        if let Some(v) = set("BACKEND_SERVICE") {
            self.services.backend = v;
        }
        if let Some(v) = set("FRONTEND_SERVICE") {
            self.services.frontend = v;
        }
        if let Some(v) = set("DB_SERVICE") {
            self.services.db = v;
        }
        if let Some(v) = set("BACKEND_WORKDIR") {
            self.workdirs.backend = v;
        }
        if let Some(v) = set("FRONTEND_WORKDIR") {
            self.workdirs.frontend = v;
        }
        if let Some(v) = set("RETRIES") {
            self.bootstrap.retries = parse_number("RETRIES", &v)?;
        }
        if let Some(v) = set("SLEEP") {
            self.bootstrap.sleep_secs = parse_number("SLEEP", &v)?;
        }
        Ok(())
    }

    /// Return human-readable warnings for suspicious values.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.compose.command.trim().is_empty() {
            warnings.push("compose.command is empty".to_string());
        }
        for (key, value) in [
            ("services.backend", &self.services.backend),
            ("services.frontend", &self.services.frontend),
            ("services.db", &self.services.db),
        ] {
            if value.trim().is_empty() {
                warnings.push(format!("{} is empty", key));
            }
        }
        if self.bootstrap.retries == 0 {
            warnings.push(
                "bootstrap.retries is 0: the database is never probed before migrations"
                    .to_string(),
            );
        }
        if !is_owner_spec(&self.bootstrap.owner) {
            warnings.push(format!(
                "bootstrap.owner '{}' is not of the form uid:gid",
                self.bootstrap.owner
            ));
        }
        if self.bootstrap.command_timeout_secs == 0 {
            warnings.push("bootstrap.command_timeout_secs is 0: every command times out".to_string());
        }

        warnings
    }
}

fn parse_number<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
        reason: "expected a non-negative integer".to_string(),
    })
}

fn is_owner_spec(owner: &str) -> bool {
    match owner.split_once(':') {
        Some((uid, gid)) => {
            !uid.is_empty()
                && !gid.is_empty()
                && uid.chars().all(|c| c.is_ascii_digit())
                && gid.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Readiness polling budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

/// Effective configuration after all layers are applied.
#[derive(Debug, Clone)]
pub struct StackConfig {
    pub project_dir: PathBuf,
    /// The config file that was loaded, if one existed
    pub config_file: Option<PathBuf>,
    pub compose: Compose,
    pub services: Services,
    pub workdirs: Workdirs,
    pub bootstrap: BootstrapSettings,
}

impl StackConfig {
    /// Resolve configuration for `project_dir` from the file and the process environment.
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        Self::load_with(project_dir, |key| std::env::var(key).ok())
    }

    /// Resolve configuration reading environment variables through `lookup`.
    pub fn load_with<F>(project_dir: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (toml, config_file) = StackToml::effective(project_dir, lookup)?;
        Self::from_toml(project_dir, toml, config_file)
    }

    pub fn from_toml(
        project_dir: &Path,
        toml: StackToml,
        config_file: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            config_file,
            compose: Compose::parse(&toml.compose.command)?,
            services: toml.services,
            workdirs: toml.workdirs,
            bootstrap: toml.bootstrap,
        })
    }

    /// Apply CLI overrides for the readiness budget.
    pub fn with_overrides(mut self, retries: Option<u32>, sleep_secs: Option<u64>) -> Self {
        if let Some(retries) = retries {
            self.bootstrap.retries = retries;
        }
        if let Some(sleep_secs) = sleep_secs {
            self.bootstrap.sleep_secs = sleep_secs;
        }
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.bootstrap.retries,
            interval: Duration::from_secs(self.bootstrap.sleep_secs),
        }
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.bootstrap.command_timeout_secs)
    }

    pub fn env_file_path(&self) -> PathBuf {
        self.project_dir.join(&self.bootstrap.env_file)
    }

    pub fn env_template_path(&self) -> PathBuf {
        self.project_dir.join(&self.bootstrap.env_template)
    }
}
