//! Dispatcher task commands: `stackctl up`, `stackctl exec`, ... and `stackctl tasks`.

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, theme::ColorfulTheme};
use stackctl::config::StackConfig;
use stackctl::errors::TaskError;
use stackctl::process::{DryRunRunner, SystemRunner};
use stackctl::tasks::{Task, TaskParams, run_plan};
use std::path::Path;
use std::process::ExitCode;
use tracing::info;

use super::super::Cli;

/// Exit status for usage errors, matching clap's.
const USAGE_EXIT: u8 = 2;

pub async fn cmd_task(
    cli: &Cli,
    project_dir: &Path,
    task: Task,
    params: &TaskParams,
) -> Result<ExitCode> {
    // Usage errors win over configuration errors.
    if let Err(err) = task.check_params(params) {
        return Ok(usage_error(err));
    }
    let config = StackConfig::load(project_dir)?;
    let plan = match task.plan(&config, params) {
        Ok(plan) => plan,
        Err(err) => return Ok(usage_error(err)),
    };

    if task.is_destructive() && !cli.yes && !cli.dry_run && !confirm(task)? {
        println!("Aborted.");
        return Ok(ExitCode::FAILURE);
    }

    info!(task = %task, commands = plan.len(), "running task");
    let code = if cli.dry_run {
        run_plan(&DryRunRunner, &plan).await?
    } else {
        run_plan(&SystemRunner::new(project_dir), &plan).await?
    };

    Ok(exit_code(code))
}

pub fn cmd_tasks() {
    stackctl::ui::print_task_list();
}

fn usage_error(err: TaskError) -> ExitCode {
    eprintln!("{} {}", style("error:").red().bold(), err);
    ExitCode::from(USAGE_EXIT)
}

fn confirm(task: Task) -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("{}: {}. Continue?", task, task.description()))
        .default(false)
        .interact()
        .with_context(|| format!("'{}' needs confirmation; pass --yes to skip the prompt", task))
}

/// Map a child's exit code onto ours; signals and out-of-range codes become 1.
fn exit_code(code: i32) -> ExitCode {
    match u8::try_from(code) {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    }
}
