//! Per-step outcomes of a bootstrap run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

/// The eight bootstrap steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepName {
    StartServices,
    EnvFile,
    WaitForDb,
    InstallBackend,
    Migrate,
    InstallFrontend,
    Seed,
    FixOwnership,
}

impl StepName {
    pub fn all() -> &'static [StepName] {
        &[
            StepName::StartServices,
            StepName::EnvFile,
            StepName::WaitForDb,
            StepName::InstallBackend,
            StepName::Migrate,
            StepName::InstallFrontend,
            StepName::Seed,
            StepName::FixOwnership,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::StartServices => "start-services",
            StepName::EnvFile => "env-file",
            StepName::WaitForDb => "wait-for-db",
            StepName::InstallBackend => "install-backend",
            StepName::Migrate => "migrate",
            StepName::InstallFrontend => "install-frontend",
            StepName::Seed => "seed",
            StepName::FixOwnership => "fix-ownership",
        }
    }

    /// Steps whose failure is swallowed entirely: logged at debug level and
    /// ignored by `--strict`.
    pub fn is_swallowed(&self) -> bool {
        matches!(self, StepName::FixOwnership)
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded(String),
    Skipped(String),
    Failed(String),
}

impl StepOutcome {
    pub fn succeeded(detail: impl Into<String>) -> Self {
        StepOutcome::Succeeded(detail.into())
    }

    pub fn skipped(detail: impl Into<String>) -> Self {
        StepOutcome::Skipped(detail.into())
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        StepOutcome::Failed(detail.into())
    }

    pub fn detail(&self) -> &str {
        match self {
            StepOutcome::Succeeded(d) | StepOutcome::Skipped(d) | StepOutcome::Failed(d) => d,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StepOutcome::Skipped(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: StepName,
    #[serde(flatten)]
    pub outcome: StepOutcome,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BootstrapReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepRecord>,
}

impl BootstrapReport {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            steps: Vec::new(),
        }
    }

    /// Record and log a step outcome.
    pub fn record(&mut self, step: StepName, outcome: StepOutcome, duration_ms: u64) {
        let detail = outcome.detail();
        match &outcome {
            StepOutcome::Succeeded(_) => info!(step = %step, "{}", detail),
            StepOutcome::Skipped(_) => info!(step = %step, "skipped: {}", detail),
            StepOutcome::Failed(_) if step.is_swallowed() => {
                debug!(step = %step, "ignored failure: {}", detail)
            }
            StepOutcome::Failed(_) => warn!(step = %step, "failed (continuing): {}", detail),
        }
        self.steps.push(StepRecord {
            step,
            outcome,
            duration_ms,
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn outcome(&self, step: StepName) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|r| r.step == step)
            .map(|r| &r.outcome)
    }

    /// Failed steps that are not swallowed.
    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps
            .iter()
            .filter(|r| r.outcome.is_failed() && !r.step.is_swallowed())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn count(&self, predicate: impl Fn(&StepOutcome) -> bool) -> usize {
        self.steps.iter().filter(|r| predicate(&r.outcome)).count()
    }
}
