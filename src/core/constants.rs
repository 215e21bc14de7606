//! Constants used throughout stagehand.
//!
//! Centralizes defaults, provider identifiers and fixed provisioning values.

/// Project config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = "stagehand.toml";

/// Config directory name under the platform config dir.
pub const CONFIG_DIR: &str = "stagehand";

/// Tracing filter environment variable.
pub const LOG_ENV: &str = "STAGEHAND_LOG";

/// Rackspace identity endpoint.
pub const DEFAULT_AUTH_URL: &str = "https://identity.api.rackspacecloud.com/v2.0/tokens";

pub const DEFAULT_REGION: &str = "LON";
pub const DEFAULT_BOOTSTRAP_TYPE: &str = "dsc";
pub const DEFAULT_INITIAL_POLICY: &str = "Set to 2";
pub const DEFAULT_SCALE_POLICY: &str = "Set to 2";
pub const DEFAULT_NODE_USERNAME: &str = "localadmin";
pub const DEFAULT_NODE_PASSWORD: &str = "Q1w2e3r4";
pub const DEFAULT_IMAGE_NAME: &str = "Windows Server 2012 R2";
pub const DEFAULT_FLAVOR_ID: &str = "general1-2";
pub const DEFAULT_ROLE: &str = "web";
pub const DEFAULT_BASE_SCRIPT_URL: &str =
    "https://raw.githubusercontent.com/iskandar/windows-automation-demo/bootstrap/scripts";
pub const DEFAULT_SETUP_URL: &str =
    "https://raw.githubusercontent.com/iskandar/windows-automation-demo/configurations/dsc/setup.json";

/// Local directory holding the personality templates.
pub const PERSONALITY_DIR: &str = "./bootstrap/personality";

/// Directory on the Windows node where personalities are written.
pub const PERSONALITY_DEST_DIR: &str = "C:\\cloud-automation";

/// Personality template file names, in submission order.
pub const PERSONALITY_FILES: &[&str] = &[
    "bootstrap.cmd",
    "bootstrap-config.json",
    "bootstrap-shim.txt",
    "setup.url",
    "setup-shim.txt",
];

/// Rendered personalities above this size risk a silent "no servers created"
/// failure on the provider side. Exceeding it only logs a warning.
pub const PERSONALITY_SOFT_LIMIT: usize = 1000;

/// Load balancer listener port, also used for the group's LB attachment.
pub const LB_PORT: u16 = 80;

/// Health monitor status regex. 4xx responses must not count as healthy.
pub const HEALTH_STATUS_REGEX: &str = "^[23][0-9][0-9]$";

/// Marker string the demo application serves, so the default IIS page does
/// not pass the health check.
pub const APP_MARKER: &str = "WINDOWS_AUTOMATION_DEMO";

/// Well-known Rackspace network ids.
pub const PUBLIC_NET_ID: &str = "00000000-0000-0000-0000-000000000000";
pub const SERVICE_NET_ID: &str = "11111111-1111-1111-1111-111111111111";

/// Scaling group shape.
pub const GROUP_COOLDOWN_SECS: u32 = 60;
pub const GROUP_MIN_ENTITIES: u32 = 0;
pub const GROUP_MAX_ENTITIES: u32 = 16;

/// Cooldown applied to every catalog policy.
pub const POLICY_COOLDOWN_SECS: u32 = 60;

/// TTL for environment A records.
pub const DNS_TTL: u32 = 300;

/// Convergence wait defaults.
pub const WAIT_TIMEOUT_SECS: u64 = 1800;
pub const POLL_INTERVAL_SECS: u64 = 10;
pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
pub const POLL_BACKOFF: f64 = 1.0;

/// Largest accepted `--poll-interval`.
pub const POLL_INTERVAL_LIMIT_SECS: u64 = 86_400;
