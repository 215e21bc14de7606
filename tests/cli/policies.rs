//! Tests for `stagehand policies`.

use crate::support::*;

#[test]
fn test_policies_catalog() {
    let t = Test::new();

    let output = t.cmd().arg("policies").output().unwrap();
    assert_success(&output);

    let catalog = stdout_json(&output);
    let entries = catalog.as_array().unwrap();
    assert_eq!(entries.len(), 12);
    assert_eq!(entries[0]["name"], "Up by 1");
    assert_eq!(entries[0]["webhook"], "Up by 1 webhook");
    assert_eq!(entries[0]["change"], 1);
    assert!(entries
        .iter()
        .any(|e| e["name"] == "Set to 2" && e["desired_capacity"] == 2));
}

#[test]
fn test_policies_needs_no_credentials() {
    let t = Test::new();

    // no --dry-run and no OS_USERNAME
    assert_success(&t.cmd().arg("policies").output().unwrap());
}
