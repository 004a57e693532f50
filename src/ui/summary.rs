use crate::bootstrap::{BootstrapReport, StepOutcome};
use crate::tasks::Task;
use crate::ui::icons::{CHECK, CROSS, SKIP, SPARKLE, WARN, WRENCH};
use console::style;

/// Print the bootstrap summary table to stdout.
pub fn print_report(report: &BootstrapReport) {
    println!();
    println!("{}", style("Bootstrap summary").bold());
    println!("{}", style("=================").dim());

    for record in &report.steps {
        let (icon, name) = match &record.outcome {
            StepOutcome::Succeeded(_) => (CHECK, style(record.step.as_str()).green()),
            StepOutcome::Skipped(_) => (SKIP, style(record.step.as_str()).dim()),
            StepOutcome::Failed(_) if record.step.is_swallowed() => {
                (WARN, style(record.step.as_str()).dim())
            }
            StepOutcome::Failed(_) => (CROSS, style(record.step.as_str()).yellow()),
        };
        println!(
            "  {}{:<18} {} {}",
            icon,
            name,
            record.outcome.detail(),
            style(format!("({}ms)", record.duration_ms)).dim()
        );
    }

    let succeeded = report.count(|o| matches!(o, StepOutcome::Succeeded(_)));
    let skipped = report.count(StepOutcome::is_skipped);
    let failed = report.failures().count();
    println!();
    if failed == 0 {
        println!(
            "{}Ready: {} done, {} skipped",
            SPARKLE,
            style(succeeded).green(),
            skipped
        );
    } else {
        println!(
            "{}Partially ready: {} done, {} skipped, {} failed (see warnings above)",
            WARN,
            style(succeeded).green(),
            skipped,
            style(failed).yellow()
        );
    }
    println!();
}

/// Print every task with its description.
pub fn print_task_list() {
    println!();
    println!("{:<18} Description", "Task");
    println!("{:<18} -----------", "------------------");
    for task in Task::all() {
        println!("{:<18} {}", task.name(), task.description());
    }
    println!();
    println!(
        "{}{:<16} {}",
        WRENCH,
        "bootstrap",
        style("First-time setup: start, env file, wait for db, install, migrate, seed").dim()
    );
    println!();
}
