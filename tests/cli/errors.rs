//! Tests for error handling and CLI flags.

use crate::support::*;
use predicates::prelude::*;

#[test]
fn test_help() {
    let t = Test::new();

    t.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("destroy"));
}

#[test]
fn test_unknown_command_fails() {
    let t = Test::new();

    let output = t.cmd().arg("unknown-command").output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_version_flag() {
    let t = Test::new();

    t.cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stagehand"));
}

#[test]
fn test_completions_bash_outputs_script() {
    let t = Test::new();

    let output = t.cmd().args(["completions", "bash"]).output().unwrap();
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.contains("_stagehand") || out.contains("complete"));
}

#[test]
fn test_completions_zsh() {
    let t = Test::new();

    t.cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef stagehand"));
}

#[test]
fn test_missing_credentials() {
    let t = Test::new();

    let output = t.cmd().args(["nodes", "win", "stg"]).output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "OS_USERNAME");
    assert_stderr_contains(&output, "--dry-run");
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_missing_environment() {
    let t = Test::new();

    let output = t.dry_run(&["nodes", "win"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "environment");
}

#[test]
fn test_app_from_env_var() {
    let t = Test::new();

    let output = t
        .cmd()
        .env("NAMESPACE", "win")
        .env("ENVIRONMENT", "stg")
        .args(["--dry-run", "nodes"])
        .output()
        .unwrap();
    assert_success(&output);
}

#[test]
fn test_empty_env_var_is_unset() {
    let t = Test::new();

    let output = t
        .cmd()
        .env("NAMESPACE", "")
        .env("ENVIRONMENT", "stg")
        .args(["--dry-run", "nodes"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "app");
}

#[test]
fn test_verbose_shows_debug_logs() {
    let t = Test::with_templates();

    let output = t.dry_run(&["--verbose", "create", "win", "stg", "--no-wait"]);
    assert_success(&output);
    assert_stderr_contains(&output, "DEBUG");
}

#[test]
fn test_default_log_level_is_info() {
    let t = Test::with_templates();

    let output = t.create("win", "stg", &["--no-wait"]);
    assert_success(&output);
    let err = stderr(&output);
    assert!(err.contains("INFO"));
    assert!(!err.contains("DEBUG"), "default mode should not show debug output");
}

#[test]
fn test_log_env_var_overrides_verbose() {
    let t = Test::with_templates();

    let output = t
        .cmd()
        .env("STAGEHAND_LOG", "stagehand=warn")
        .args(["--verbose", "--dry-run", "create", "win", "stg", "--no-wait"])
        .output()
        .unwrap();
    assert_success(&output);
    let err = stderr(&output);
    assert!(!err.contains("INFO") && !err.contains("DEBUG"));
}

#[test]
fn test_log_json() {
    let t = Test::with_templates();

    let output = t.dry_run(&["--log-json", "create", "win", "stg", "--no-wait"]);
    assert_success(&output);
    assert_stderr_contains(&output, "\"level\":\"INFO\"");
    // stdout still holds only the report
    stdout_json(&output);
}

#[test]
fn test_secrets_never_logged() {
    let t = Test::with_templates();

    let output = t.dry_run(&[
        "--verbose",
        "create",
        "win",
        "stg",
        "--no-wait",
        "--node-password",
        "Sup3rS3cret!",
        "--api-token",
        "tok-abc123",
    ]);
    assert_success(&output);
    let all = format!("{}{}", stdout(&output), stderr(&output));
    assert!(!all.contains("Sup3rS3cret!"));
    assert!(!all.contains("tok-abc123"));
}
