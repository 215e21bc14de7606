//! Tests for `stagehand nodes`.

use crate::support::*;

#[test]
fn test_nodes_empty() {
    let t = Test::new();

    let output = t.nodes("win", "stg");
    assert_success(&output);
    assert_eq!(stdout_json(&output), serde_json::json!([]));
    assert_stderr_contains(&output, "no web nodes in win-stg");
}

#[test]
fn test_nodes_role_argument() {
    let t = Test::new();

    let output = t.dry_run(&["nodes", "win", "stg", "db"]);
    assert_success(&output);
    assert_stderr_contains(&output, "no db nodes");
}

#[test]
fn test_nodes_role_from_env() {
    let t = Test::new();

    let output = t
        .cmd()
        .env("ROLE", "worker")
        .args(["--dry-run", "nodes", "win", "stg"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_stderr_contains(&output, "no worker nodes");
}
