//! Integration tests for stackctl
//!
//! The binary is driven against a fake compose executable (a shell script set
//! as `COMPOSE_CMD`) that appends each invocation's arguments to a log file and
//! exits according to `FAKE_*` environment variables.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FAKE_COMPOSE: &str = r#"#!/bin/sh
printf '%s\n' "$*" >> "$FAKE_COMPOSE_LOG"
for arg in "$@"; do
  case "$arg" in
    pg_isready) exit "${FAKE_PG_STATUS:-0}" ;;
    test|grep|sh) exit "${FAKE_TEST_STATUS:-0}" ;;
    upgrade) exit "${FAKE_MIGRATE_STATUS:-0}" ;;
  esac
done
if [ "$1" = "up" ]; then
  exit "${FAKE_UP_STATUS:-0}"
fi
exit "${FAKE_DEFAULT_STATUS:-0}"
"#;

/// Variables the binary reads that must not leak in from the test environment.
const ISOLATED_VARS: &[&str] = &[
    "SERVICE",
    "CMD",
    "BACKEND_SERVICE",
    "FRONTEND_SERVICE",
    "DB_SERVICE",
    "BACKEND_WORKDIR",
    "FRONTEND_WORKDIR",
    "RETRIES",
    "SLEEP",
    "RUST_LOG",
];

struct Project {
    dir: TempDir,
    compose: PathBuf,
    log: PathBuf,
}

impl Project {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let compose = dir.path().join("fake-compose.sh");
        fs::write(&compose, FAKE_COMPOSE).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&compose).unwrap().permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&compose, perms).unwrap();
        }
        let log = dir.path().join("compose.log");
        Self { dir, compose, log }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A stackctl command rooted in the project, wired to the fake compose.
    fn stackctl(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("stackctl");
        for var in ISOLATED_VARS {
            cmd.env_remove(var);
        }
        cmd.current_dir(self.path())
            .env("COMPOSE_CMD", &self.compose)
            .env("FAKE_COMPOSE_LOG", &self.log)
            .env("SLEEP", "0");
        cmd
    }

    /// Argument lines recorded by the fake compose, in call order.
    fn calls(&self) -> Vec<String> {
        match fs::read_to_string(&self.log) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        cargo_bin_cmd!("stackctl").arg("--help").assert().success();
    }

    #[test]
    fn test_version() {
        cargo_bin_cmd!("stackctl").arg("--version").assert().success();
    }

    #[test]
    fn test_tasks_lists_every_task() {
        let project = Project::new();
        let assert = project.stackctl().arg("tasks").assert().success();
        let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
        for name in [
            "up",
            "up-detached",
            "down",
            "rebuild",
            "logs",
            "ps",
            "exec",
            "shell",
            "install-backend",
            "install-frontend",
            "migrate",
            "seed",
            "test",
            "fmt",
            "backend-up",
            "frontend-up",
            "db-up",
            "prune-volumes",
            "clean-images",
            "bootstrap",
        ] {
            assert!(stdout.contains(name), "missing task {}", name);
        }
    }

    #[test]
    fn test_invalid_log_format() {
        let project = Project::new();
        project
            .stackctl()
            .args(["--log-format", "yaml", "ps"])
            .assert()
            .failure();
        assert!(project.calls().is_empty());
    }
}

// =============================================================================
// Task Dispatcher Tests
// =============================================================================

mod tasks {
    use super::*;

    #[test]
    fn test_dry_run_prints_plan() {
        let project = Project::new();
        project
            .stackctl()
            .env("COMPOSE_CMD", "docker compose")
            .args(["--dry-run", "rebuild"])
            .assert()
            .success()
            .stdout(predicate::str::contains("docker compose build --no-cache"))
            .stdout(predicate::str::contains("docker compose up -d --force-recreate"));
    }

    #[test]
    fn test_dry_run_exec_quotes_command() {
        let project = Project::new();
        project
            .stackctl()
            .env("COMPOSE_CMD", "docker-compose")
            .args(["--dry-run", "exec", "--service", "backend", "--cmd", "ls -la"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#"docker-compose exec backend sh -c "ls -la""#,
            ));
    }

    #[test]
    fn test_up_detached_runs_compose() {
        let project = Project::new();
        project.stackctl().arg("up-detached").assert().success();
        assert_eq!(project.calls(), vec!["up -d"]);
    }

    #[test]
    fn test_exec_from_environment_variables() {
        let project = Project::new();
        project
            .stackctl()
            .env("SERVICE", "backend")
            .env("CMD", "python manage.py check")
            .arg("exec")
            .assert()
            .success();
        assert_eq!(project.calls(), vec!["exec backend sh -c python manage.py check"]);
    }

    #[test]
    fn test_exec_without_service_issues_nothing() {
        let project = Project::new();
        project
            .stackctl()
            .args(["exec", "--cmd", "ls"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("SERVICE"))
            .stderr(predicate::str::contains("usage:"));
        assert!(project.calls().is_empty());
    }

    #[test]
    fn test_exec_without_cmd_issues_nothing() {
        let project = Project::new();
        project
            .stackctl()
            .args(["exec", "--service", "backend"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("CMD"));
        assert!(project.calls().is_empty());
    }

    #[test]
    fn test_missing_parameter_reported_before_config_errors() {
        let project = Project::new();
        project
            .stackctl()
            .env("RETRIES", "abc")
            .args(["exec", "--cmd", "ls"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("SERVICE"));
        assert!(project.calls().is_empty());
    }

    #[test]
    fn test_shell_with_blank_service_issues_nothing() {
        let project = Project::new();
        project
            .stackctl()
            .args(["shell", "--service", "  "])
            .assert()
            .code(2);
        assert!(project.calls().is_empty());
    }

    #[test]
    fn test_child_exit_code_is_propagated() {
        let project = Project::new();
        project
            .stackctl()
            .env("FAKE_DEFAULT_STATUS", "3")
            .arg("ps")
            .assert()
            .code(3);
    }

    #[test]
    fn test_configured_services_are_used() {
        let project = Project::new();
        project
            .stackctl()
            .env("DB_SERVICE", "postgres")
            .arg("db-up")
            .assert()
            .success();
        assert_eq!(project.calls(), vec!["up -d postgres"]);
    }

    #[test]
    fn test_prune_volumes_with_yes() {
        let project = Project::new();
        project
            .stackctl()
            .args(["--yes", "prune-volumes"])
            .assert()
            .success();
        assert_eq!(project.calls(), vec!["down -v"]);
    }
}

// =============================================================================
// Bootstrap Tests
// =============================================================================

mod bootstrap {
    use super::*;

    #[test]
    fn test_fresh_checkout_end_to_end() {
        let project = Project::new();
        project
            .stackctl()
            .arg("bootstrap")
            .assert()
            .success()
            .stdout(predicate::str::contains("Bootstrap summary"));

        assert_eq!(
            project.calls(),
            vec![
                "up -d",
                "exec -T db pg_isready -U postgres",
                "exec -T -w /app backend test -f requirements.txt",
                "exec -T -w /app backend pip install -r requirements.txt",
                "exec -T -w /app backend test -d alembic",
                "exec -T -w /app backend alembic upgrade head",
                "exec -T -w /app frontend test -f package.json",
                "exec -T -w /app frontend test -f package-lock.json",
                "exec -T -w /app frontend npm ci",
                "exec -T -w /app backend test -f scripts/seed.py",
                "exec -T -w /app backend python scripts/seed.py",
                "exec -T -u root backend chown -R 1000:1000 /app",
            ]
        );
        let env = fs::read_to_string(project.path().join(".env")).unwrap();
        assert!(env.contains("DATABASE_URL="));
    }

    #[test]
    fn test_second_run_keeps_env_file() {
        let project = Project::new();
        project.stackctl().arg("bootstrap").assert().success();
        let first = fs::read(project.path().join(".env")).unwrap();

        fs::write(project.path().join(".env.example"), "LATE_TEMPLATE=1\n").unwrap();
        project.stackctl().arg("bootstrap").assert().success();

        assert_eq!(fs::read(project.path().join(".env")).unwrap(), first);
    }

    #[test]
    fn test_db_never_ready_probes_exactly_retries_times() {
        let project = Project::new();
        project
            .stackctl()
            .env("FAKE_PG_STATUS", "1")
            .env("RETRIES", "4")
            .arg("bootstrap")
            .assert()
            .success()
            .stderr(predicate::str::contains("timed out waiting for readiness"));

        let probes = project
            .calls()
            .iter()
            .filter(|line| line.contains("pg_isready"))
            .count();
        assert_eq!(probes, 4);
    }

    #[test]
    fn test_cli_retries_override_env() {
        let project = Project::new();
        project
            .stackctl()
            .env("FAKE_PG_STATUS", "1")
            .env("RETRIES", "4")
            .args(["bootstrap", "--retries", "2"])
            .assert()
            .success();

        let probes = project
            .calls()
            .iter()
            .filter(|line| line.contains("pg_isready"))
            .count();
        assert_eq!(probes, 2);
    }

    #[test]
    fn test_missing_manifests_skip_installs() {
        let project = Project::new();
        project
            .stackctl()
            .env("FAKE_TEST_STATUS", "1")
            .arg("bootstrap")
            .assert()
            .success();

        let calls = project.calls();
        assert!(!calls.iter().any(|l| l.contains("pip install")));
        assert!(!calls.iter().any(|l| l.contains("npm")));
        assert!(!calls.iter().any(|l| l.contains("alembic upgrade")));
        assert!(!calls.iter().any(|l| l.contains("python scripts/seed.py")));
    }

    #[test]
    fn test_start_failure_aborts() {
        let project = Project::new();
        project
            .stackctl()
            .env("FAKE_UP_STATUS", "1")
            .arg("bootstrap")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Starting services failed"));

        assert_eq!(project.calls(), vec!["up -d"]);
        assert!(!project.path().join(".env").exists());
    }

    #[test]
    fn test_failed_migration_still_exits_zero() {
        let project = Project::new();
        project
            .stackctl()
            .env("FAKE_MIGRATE_STATUS", "1")
            .arg("bootstrap")
            .assert()
            .success();

        assert!(
            project
                .calls()
                .contains(&"exec -T -w /app backend python scripts/seed.py".to_string())
        );
    }

    #[test]
    fn test_strict_fails_on_failed_step() {
        let project = Project::new();
        project
            .stackctl()
            .env("FAKE_MIGRATE_STATUS", "1")
            .args(["bootstrap", "--strict"])
            .assert()
            .code(1);
    }

    #[test]
    fn test_dry_run_runs_nothing_and_writes_nothing() {
        let project = Project::new();
        project
            .stackctl()
            .args(["--dry-run", "bootstrap"])
            .assert()
            .success()
            .stdout(predicate::str::contains("up -d"))
            .stdout(predicate::str::contains("alembic upgrade head"))
            .stdout(predicate::str::contains("chown -R 1000:1000 /app"))
            .stdout(predicate::str::contains("dry run: would create .env"));

        assert!(project.calls().is_empty());
        assert!(!project.path().join(".env").exists());
    }

    #[test]
    fn test_json_report() {
        let project = Project::new();
        let assert = project
            .stackctl()
            .args(["bootstrap", "--format", "json"])
            .assert()
            .success();

        let report: serde_json::Value =
            serde_json::from_slice(&assert.get_output().stdout).unwrap();
        let steps = report["steps"].as_array().unwrap();
        assert_eq!(steps.len(), 8);
        assert_eq!(steps[0]["step"], "start-services");
        assert_eq!(steps[1]["step"], "env-file");
        assert_eq!(steps[1]["status"], "succeeded");
        assert_eq!(steps[7]["step"], "fix-ownership");
    }

    #[test]
    fn test_invalid_retries_is_rejected_before_any_command() {
        let project = Project::new();
        project
            .stackctl()
            .env("RETRIES", "many")
            .arg("bootstrap")
            .assert()
            .failure()
            .stderr(predicate::str::contains("RETRIES"));
        assert!(project.calls().is_empty());
    }
}

// =============================================================================
// Configuration Tests
// =============================================================================

mod configuration {
    use super::*;

    #[test]
    fn test_config_show_defaults() {
        let project = Project::new();
        project
            .stackctl()
            .env_remove("COMPOSE_CMD")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Using default configuration"))
            .stdout(predicate::str::contains("command = \"docker-compose\""))
            .stdout(predicate::str::contains("retries = 12"));
    }

    #[test]
    fn test_config_init_creates_toml() {
        let project = Project::new();
        project
            .stackctl()
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created stackctl.toml"));
        assert!(project.path().join("stackctl.toml").exists());

        project
            .stackctl()
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn test_config_validate_warnings() {
        let project = Project::new();
        fs::write(
            project.path().join("stackctl.toml"),
            "[bootstrap]\nretries = 0\n",
        )
        .unwrap();
        project
            .stackctl()
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("bootstrap.retries is 0"));
    }

    #[test]
    fn test_config_validate_checks_env_overrides() {
        let project = Project::new();
        project
            .stackctl()
            .env("RETRIES", "0")
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("bootstrap.retries is 0"));
    }

    #[test]
    fn test_file_config_drives_bootstrap() {
        let project = Project::new();
        fs::write(
            project.path().join("stackctl.toml"),
            r#"
[services]
backend = "api"

[bootstrap]
env_file = "backend/.env"
owner = "501:20"
"#,
        )
        .unwrap();

        project.stackctl().arg("bootstrap").assert().success();

        assert!(project.path().join("backend/.env").exists());
        assert!(
            project
                .calls()
                .contains(&"exec -T -u root api chown -R 501:20 /app".to_string())
        );
    }
}
