//! Test fixtures and constants.

/// Personality template file names.
pub const PERSONALITY_FILES: &[&str] = &[
    "bootstrap.cmd",
    "bootstrap-config.json",
    "bootstrap-shim.txt",
    "setup.url",
    "setup-shim.txt",
];

/// Environment variables the CLI reads; cleared for every test command.
pub const CONFIG_ENV_VARS: &[&str] = &[
    "OS_REGION",
    "OS_USERNAME",
    "OS_API_KEY",
    "OS_AUTH_URL",
    "NAMESPACE",
    "ENVIRONMENT",
    "ROLE",
    "DOMAIN_NAME",
    "NODE_PASSWORD",
    "SETUP_API_TOKEN",
    "AA_DSC_REG_URL",
    "AA_DSC_REG_KEY",
    "AA_DSC_NODE_CONFIG_NAME",
    "STAGEHAND_LOG",
    "STAGEHAND_CONFIG",
];

/// Image the dry-run cloud is seeded with by default.
pub const DEFAULT_IMAGE: &str = "Windows Server 2012 R2";

/// A config file with every non-secret setting.
pub const FULL_CONFIG: &str = r#"
region = "DFW"
app = "shop"
environment = "prd"
domain_name = "example.com"
bootstrap_type = "chef"
initial_policy = "Set to 4"
flavor_id = "general1-4"
wait_timeout_secs = 600
poll_interval_secs = 5
"#;
