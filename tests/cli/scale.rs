//! Tests for `stagehand scale`.
//!
//! Each dry run starts from an empty cloud, so the group never exists here;
//! execution against a real group is covered by the library tests.

use crate::support::*;
use predicates::prelude::*;

#[test]
fn test_scale_missing_group_is_warning() {
    let t = Test::new();

    let output = t.scale("win", "stg", &[]);
    assert_success(&output);
    assert_stderr_contains(&output, "scaling group win-stg not found");

    let outcome = stdout_json(&output);
    assert_eq!(outcome["status"], "group_not_found");
    assert_eq!(outcome["group"], "win-stg");
}

#[test]
fn test_scale_strict_fails() {
    let t = Test::new();

    t.cmd()
        .args(["--dry-run", "scale", "win", "stg", "--strict"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_scale_policy_name_flag() {
    let t = Test::new();

    let output = t.scale("win", "stg", &["--policy-name", "Up by 1"]);
    assert_success(&output);
    assert_stderr_contains(&output, "Executing Up by 1 on win-stg");
}
