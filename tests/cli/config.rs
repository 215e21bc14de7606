//! Tests for configuration files and precedence.

use crate::support::*;

#[test]
fn test_config_file_supplies_settings() {
    let t = Test::with_templates();
    t.write_config(FULL_CONFIG);

    let output = t
        .cmd()
        .args(["--dry-run", "create", "--no-wait"])
        .output()
        .unwrap();
    assert_success(&output);

    let report = stdout_json(&output);
    assert_eq!(report["name"], "shop-prd");
    assert_eq!(report["metadata"]["bootstrap_type"], "chef");
    assert_eq!(report["policies"]["executed"], "Set to 4");
    assert_eq!(report["dns"]["fqdn"], "shop-prd.example.com");
    assert_stderr_contains(&output, "DFW");
}

#[test]
fn test_flag_beats_env_beats_file() {
    let t = Test::with_templates();
    t.write_config(FULL_CONFIG);

    let output = t
        .cmd()
        .env("DOMAIN_NAME", "env.example")
        .env("ENVIRONMENT", "stg")
        .args(["--dry-run", "create", "--no-wait", "--domain-name", "flag.example"])
        .output()
        .unwrap();
    assert_success(&output);

    let report = stdout_json(&output);
    assert_eq!(report["name"], "shop-stg");
    assert_eq!(report["dns"]["fqdn"], "shop-stg.flag.example");
}

#[test]
fn test_explicit_config_path() {
    let t = Test::with_templates();
    let path = t.dir.path().join("custom.toml");
    std::fs::write(&path, "app = \"blog\"\nenvironment = \"dev\"\n").unwrap();

    let output = t
        .cmd()
        .args(["--dry-run", "--config", path.to_str().unwrap(), "nodes"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_stderr_contains(&output, "blog-dev");
}

#[test]
fn test_missing_explicit_config_fails() {
    let t = Test::new();

    let output = t.dry_run(&["--config", "nope.toml", "nodes", "win", "stg"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "config file not found");
}

#[test]
fn test_config_file_rejects_secrets() {
    let t = Test::new();
    t.write_config("app = \"win\"\nnode_password = \"hunter2\"\n");

    let output = t.nodes("win", "stg");
    assert_failure(&output);
    assert_stderr_contains(&output, "failed to parse config file");
}

#[test]
fn test_user_config_dir() {
    let t = Test::new();
    let dir = t.home.path().join(".config").join("stagehand");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "app = \"win\"\nenvironment = \"qa\"\n").unwrap();

    let output = t.dry_run(&["nodes"]);
    // dirs only honours XDG_CONFIG_HOME on Linux
    if cfg!(target_os = "linux") {
        assert_success(&output);
        assert_stderr_contains(&output, "win-qa");
    }
}
