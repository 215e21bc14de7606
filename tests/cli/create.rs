//! Tests for `stagehand create`.

use crate::support::*;

#[test]
fn test_create_dry_run() {
    let t = Test::with_templates();

    let output = t.create("win", "stg", &[]);
    assert_success(&output);

    let report = stdout_json(&output);
    assert_eq!(report["name"], "win-stg");
    assert_eq!(report["metadata"]["app"], "win");
    assert_eq!(report["metadata"]["environment"], "stg");
    assert_eq!(report["metadata"]["role"], "web");
    assert_eq!(report["metadata"]["bootstrap_type"], "dsc");
    assert_eq!(report["load_balancer"]["name"], "win-stg-lb");
    assert_eq!(report["policies"]["policies"].as_array().unwrap().len(), 12);
    assert_eq!(report["policies"]["executed"], "Set to 2");
    assert_eq!(report["state"]["state"]["active_capacity"], 2);
    assert!(report["dns"].is_null());
    assert!(report["created_at"].is_string());
}

#[test]
fn test_create_personality_summary() {
    let t = Test::with_templates();

    let output = t.create("win", "stg", &["--no-wait"]);
    assert_success(&output);

    let report = stdout_json(&output);
    let personality = report["personality"].as_array().unwrap();
    assert_eq!(personality.len(), 5);
    assert_eq!(personality[0]["path"], "C:\\cloud-automation\\bootstrap.cmd");
    assert_eq!(personality[0]["sha256"].as_str().unwrap().len(), 64);
    // contents are never echoed
    assert!(personality[0].get("contents").is_none());
}

#[test]
fn test_create_is_deterministic() {
    let t = Test::with_templates();

    let digests = |output: &std::process::Output| {
        stdout_json(output)["personality"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["sha256"].as_str().unwrap().to_string())
            .collect::<Vec<_>>()
    };
    let first = t.create("win", "stg", &["--no-wait"]);
    let second = t.create("win", "stg", &["--no-wait"]);
    assert_success(&first);
    assert_success(&second);
    assert_eq!(digests(&first), digests(&second));
}

#[test]
fn test_create_with_domain() {
    let t = Test::with_templates();

    let output = t.create("win", "stg", &["--domain-name", "example.com", "--no-wait"]);
    assert_success(&output);

    let report = stdout_json(&output);
    assert_eq!(report["dns"]["status"], "synced");
    assert_eq!(report["dns"]["fqdn"], "win-stg.example.com");
    assert_eq!(report["dns"]["records"][0]["type"], "A");
    assert_eq!(report["dns"]["records"][0]["ttl"], 300);
}

#[test]
fn test_create_initial_policy() {
    let t = Test::with_templates();

    let output = t.create("win", "stg", &["--initial-policy", "Set to 6"]);
    assert_success(&output);
    assert_eq!(stdout_json(&output)["state"]["state"]["active_capacity"], 6);
}

#[test]
fn test_create_zero_capacity_fails() {
    let t = Test::with_templates();

    let output = t.create("win", "stg", &["--initial-policy", "Set to 0"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "no active nodes");
    assert_stderr_contains(&output, "stagehand destroy");
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_create_missing_templates_fails() {
    let t = Test::new();

    let output = t.create("win", "stg", &[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "personality template");
    assert_stderr_contains(&output, "--personality-dir");
}

#[test]
fn test_create_personality_dir_flag() {
    let t = Test::new();

    let output = t.create(
        "win",
        "stg",
        &[
            "--personality-dir",
            shipped_templates().to_str().unwrap(),
            "--no-wait",
        ],
    );
    assert_success(&output);
}

#[test]
fn test_create_image_from_config_file() {
    let t = Test::with_templates();

    t.write_config("image_name = \"Windows Server 2019\"\n");
    let output = t.create("win", "stg", &["--no-wait"]);
    assert_success(&output);
    assert_stderr_contains(&output, "Windows Server 2019");
}

#[test]
fn test_create_invalid_bootstrap_type() {
    let t = Test::with_templates();

    let output = t.create("win", "stg", &["--bootstrap-type", "puppet"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "bootstrap_type");
}

#[test]
fn test_create_invalid_backoff() {
    let t = Test::with_templates();

    let output = t.create("win", "stg", &["--poll-backoff", "0.5"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "poll_backoff");
}

#[test]
fn test_create_progress_on_stderr() {
    let t = Test::with_templates();

    let output = t.create("win", "stg", &["--no-wait"]);
    assert_success(&output);
    assert_stderr_contains(&output, "Environment win-stg");
    assert_stderr_contains(&output, "load balancer win-stg-lb");
    assert_stderr_contains(&output, "12 policies");
}
