//! Tests for `stagehand destroy`.

use crate::support::*;
use predicates::prelude::*;

#[test]
fn test_destroy_requires_yes_without_terminal() {
    let t = Test::new();

    t.cmd()
        .args(["--dry-run", "destroy", "win", "stg"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--yes"));
}

#[test]
fn test_destroy_nothing_to_do() {
    let t = Test::new();

    let output = t.destroy("win", "stg", &["--yes"]);
    assert_success(&output);
    assert_stderr_contains(&output, "nothing to destroy");

    let report = stdout_json(&output);
    assert_eq!(report["scaling_groups"]["status"], "not_found");
    assert_eq!(report["load_balancers"]["status"], "not_found");
    assert!(report["dns_records"].is_null());
}

#[test]
fn test_destroy_with_domain() {
    let t = Test::new();

    let output = t.destroy("win", "stg", &["--yes", "--domain-name", "example.com"]);
    assert_success(&output);
    assert_eq!(stdout_json(&output)["dns_records"]["status"], "not_found");
}
