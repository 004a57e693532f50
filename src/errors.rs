//! Typed error hierarchy for stackctl.
//!
//! Four enums cover the subsystems:
//! - `TaskError`: usage failures in the task dispatcher
//! - `ProcessError`: spawning or waiting on an external command
//! - `ConfigError`: loading `stackctl.toml` and environment overrides
//! - `BootstrapError`: the one failure allowed to abort a bootstrap run

use std::path::PathBuf;
use thiserror::Error;

/// Errors from resolving a task into its command plan.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{task}: missing required parameter {param}\nusage: {usage}")]
    MissingParameter {
        task: &'static str,
        param: &'static str,
        usage: &'static str,
    },
}

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to spawn `{program}`: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {secs}s")]
    TimedOut { command: String, secs: u64 },

    #[error("Failed to wait for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        var: String,
        value: String,
        reason: String,
    },

    #[error("Compose command is empty; set COMPOSE_CMD or [compose] command")]
    EmptyComposeCommand,
}

/// Fatal bootstrap errors. Everything after service start degrades to a step outcome instead.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Starting services failed with exit code {code}: {detail}")]
    StartFailed { code: i32, detail: String },

    #[error(transparent)]
    Process(#[from] ProcessError),
}
