//! First-time environment setup: `stackctl bootstrap`.

use anyhow::{Context, Result};
use console::style;
use stackctl::bootstrap::Bootstrap;
use stackctl::config::StackConfig;
use stackctl::process::{CommandRunner, DryRunRunner, SystemRunner};
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportFormat {
    Text,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => anyhow::bail!("Invalid report format '{}'. Valid values: text, json", s),
        }
    }
}

pub async fn cmd_bootstrap(
    project_dir: &Path,
    retries: Option<u32>,
    sleep: Option<u64>,
    strict: bool,
    dry_run: bool,
    format: &str,
) -> Result<ExitCode> {
    let format: ReportFormat = format.parse()?;
    let config = StackConfig::load(project_dir)?.with_overrides(retries, sleep);
    let system = SystemRunner::new(project_dir);
    let runner: &dyn CommandRunner = if dry_run { &DryRunRunner } else { &system };

    let bootstrap = Bootstrap::new(&config, runner).dry_run(dry_run);
    let report = match bootstrap.run().await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "bootstrap aborted");
            eprintln!("{} {}", style("error:").red().bold(), e);
            return Ok(ExitCode::FAILURE);
        }
    };

    match format {
        ReportFormat::Text => stackctl::ui::print_report(&report),
        ReportFormat::Json => {
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{}", json);
        }
    }

    if strict && report.has_failures() {
        warn!(
            failed = report.failures().count(),
            "--strict: best-effort steps failed"
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
