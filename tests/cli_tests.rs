use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use assert_cmd::Command;
use predicates::prelude::*;

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn write_temp_config(contents: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let suffix = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.push(format!("stackdeploy-cli-test-{nanos}-{suffix}.toml"));
    fs::write(&path, contents).expect("write temp config");
    path
}

fn stackdeploy() -> Command {
    let mut cmd = Command::cargo_bin("stackdeploy").expect("binary built");
    cmd.env_remove("RUST_LOG").arg("--color").arg("never");
    cmd
}

#[test]
fn help_lists_subcommands() {
    stackdeploy()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("undeploy"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn deploy_help_documents_order_flag() {
    stackdeploy()
        .args(["deploy", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--config-order"))
        .stdout(predicate::str::contains("--parallel"));
}

#[test]
fn deploy_without_project_fails() {
    stackdeploy()
        .args(["deploy", "-s", "infra"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project_name"));
}

#[test]
fn undeploy_without_stack_fails() {
    stackdeploy()
        .args(["undeploy", "-p", "demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("stack_name"));
}

#[test]
fn invalid_stack_inputs_are_rejected_by_parser() {
    stackdeploy()
        .args(["deploy", "-p", "demo", "-s", "infra", "--stack-inputs", "not json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("stack inputs must be a JSON object"));
}

#[test]
fn missing_run_file_fails() {
    stackdeploy()
        .args(["deploy", "-c", "/nonexistent/stackdeploy.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn invalid_run_file_value_fails() {
    let path = write_temp_config(concat!(
        "project_name = \"demo\"\n",
        "stack_name = \"infra\"\n",
        "\n",
        "[parallel]\n",
        "max_workers = 0\n",
    ));
    let assert = stackdeploy().arg("deploy").arg("--config").arg(&path).assert();
    let _ = fs::remove_file(&path);

    assert
        .failure()
        .stderr(predicate::str::contains("max_workers"));
}

#[test]
fn definition_update_requires_existing_file() {
    stackdeploy()
        .args([
            "deploy",
            "-p",
            "demo",
            "-s",
            "infra",
            "--stack-definition-update",
            "--stack-def-path",
            "/nonexistent/stack_definition.json",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("stack_def_path"));
}

#[test]
fn sentinel_inputs_require_api_key_variable() {
    stackdeploy()
        .env_remove("STACKDEPLOY_CLI_TEST_KEY")
        .args([
            "deploy",
            "-p",
            "demo",
            "-s",
            "infra",
            "--stack-api-key-env",
            "STACKDEPLOY_CLI_TEST_KEY",
            "--stack-inputs",
            r#"{"ibmcloud_api_key": "API_KEY"}"#,
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("STACKDEPLOY_CLI_TEST_KEY"));
}

#[test]
fn json_mode_reports_fatal_error_as_json() {
    stackdeploy()
        .args(["--json", "deploy", "-s", "infra"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(r#""type":"error""#));
}
