//! CLI tests for the mt binary

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn config_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp config");
    writeln!(
        file,
        "maintenance:\n  threads: 1\n  seconds-actions-block: 2\nlogging:\n  level: warn"
    )
    .expect("Failed to write temp config");
    file
}

fn mt(config: &NamedTempFile) -> Command {
    let mut cmd = Command::cargo_bin("mt").expect("mt binary");
    cmd.arg("--config").arg(config.path());
    cmd
}

#[test]
fn test_exec_success_json() {
    let config = config_file();
    mt(&config)
        .args(["exec", "name=Countdown", "iterate_count=2", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"state\": 5"))
        .stdout(predicate::str::contains("\"progress\": 2"));
}

#[test]
fn test_exec_failure_exits_nonzero() {
    let config = config_file();
    mt(&config)
        .args(["exec", "name=Countdown", "iterate_count=3", "result_code=1", "-f", "json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"state\": 6"))
        .stderr(predicate::str::contains("Action 1 failed"));
}

#[test]
fn test_exec_unknown_type() {
    let config = config_file();
    mt(&config)
        .args(["exec", "name=DropIndex"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown action type: DropIndex"));
}

#[test]
fn test_exec_rejects_malformed_field() {
    let config = config_file();
    mt(&config).args(["exec", "Countdown"]).assert().failure();
}

#[test]
fn test_types_lists_countdown() {
    let config = config_file();
    mt(&config)
        .arg("types")
        .assert()
        .success()
        .stdout(predicate::str::contains("Countdown"));
}

#[test]
fn test_config_prints_effective_values() {
    let config = config_file();
    mt(&config)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("seconds-actions-block: 2"))
        .stdout(predicate::str::contains("threads: 1"));
}

#[test]
fn test_run_plan() {
    let config = config_file();
    let mut plan = NamedTempFile::new().expect("Failed to create temp plan");
    writeln!(
        plan,
        r#"actions:
  - description: {{name: Countdown, iterate_count: 100, result_code: 1}}
  - description: {{name: Countdown, iterate_count: 2}}
    properties: {{shard: s1001}}
  - description: {{name: Countdown, iterate_count: 2}}
"#
    )
    .expect("Failed to write temp plan");

    mt(&config)
        .arg("run")
        .arg(plan.path())
        .args(["--threads", "1", "--format", "table"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rejected"))
        .stdout(predicate::str::contains("2 accepted, 1 rejected"));
}
