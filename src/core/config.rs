//! Configuration resolution.
//!
//! Every command resolves its settings the same way, field by field:
//!
//! 1. command-line flag
//! 2. environment variable
//! 3. config file (`--config PATH`, `./stagehand.toml`, or
//!    `<config dir>/stagehand/config.toml`)
//! 4. built-in default
//!
//! Empty environment variables count as unset. The config file cannot hold
//! credentials or secrets; those come from flags or the environment only.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::core::constants;
use crate::core::naming::EnvironmentNames;
use crate::core::poller::PollPolicy;
use crate::core::types::Secret;
use crate::error::{ConfigError, Result};

/// One source of settings. Unset fields fall through to the next layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigLayer {
    pub region: Option<String>,
    pub username: Option<String>,
    pub api_key: Option<Secret>,
    pub auth_url: Option<String>,
    pub app: Option<String>,
    pub environment: Option<String>,
    pub role: Option<String>,
    pub domain_name: Option<String>,
    pub bootstrap_type: Option<String>,
    pub initial_policy: Option<String>,
    pub node_username: Option<String>,
    pub node_password: Option<Secret>,
    pub image_name: Option<String>,
    pub flavor_id: Option<String>,
    pub base_script_url: Option<String>,
    pub setup_url: Option<String>,
    pub api_token: Option<Secret>,
    pub dsc_reg_url: Option<String>,
    pub dsc_reg_key: Option<Secret>,
    pub dsc_node_config_name: Option<String>,
    pub personality_dir: Option<PathBuf>,
    pub policy_name: Option<String>,
    pub wait_timeout_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
    pub poll_backoff: Option<f64>,
}

impl ConfigLayer {
    /// Fill unset fields from `lower`.
    pub fn or(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            region: self.region.or(lower.region),
            username: self.username.or(lower.username),
            api_key: self.api_key.or(lower.api_key),
            auth_url: self.auth_url.or(lower.auth_url),
            app: self.app.or(lower.app),
            environment: self.environment.or(lower.environment),
            role: self.role.or(lower.role),
            domain_name: self.domain_name.or(lower.domain_name),
            bootstrap_type: self.bootstrap_type.or(lower.bootstrap_type),
            initial_policy: self.initial_policy.or(lower.initial_policy),
            node_username: self.node_username.or(lower.node_username),
            node_password: self.node_password.or(lower.node_password),
            image_name: self.image_name.or(lower.image_name),
            flavor_id: self.flavor_id.or(lower.flavor_id),
            base_script_url: self.base_script_url.or(lower.base_script_url),
            setup_url: self.setup_url.or(lower.setup_url),
            api_token: self.api_token.or(lower.api_token),
            dsc_reg_url: self.dsc_reg_url.or(lower.dsc_reg_url),
            dsc_reg_key: self.dsc_reg_key.or(lower.dsc_reg_key),
            dsc_node_config_name: self.dsc_node_config_name.or(lower.dsc_node_config_name),
            personality_dir: self.personality_dir.or(lower.personality_dir),
            policy_name: self.policy_name.or(lower.policy_name),
            wait_timeout_secs: self.wait_timeout_secs.or(lower.wait_timeout_secs),
            poll_interval_secs: self.poll_interval_secs.or(lower.poll_interval_secs),
            poll_backoff: self.poll_backoff.or(lower.poll_backoff),
        }
    }

    /// Layer read from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Layer read through `lookup`, so tests need not touch the process
    /// environment.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        ConfigLayer {
            region: get("OS_REGION"),
            username: get("OS_USERNAME"),
            api_key: get("OS_API_KEY").map(Secret::from),
            auth_url: get("OS_AUTH_URL"),
            app: get("NAMESPACE"),
            environment: get("ENVIRONMENT"),
            role: get("ROLE"),
            domain_name: get("DOMAIN_NAME"),
            node_password: get("NODE_PASSWORD").map(Secret::from),
            api_token: get("SETUP_API_TOKEN").map(Secret::from),
            dsc_reg_url: get("AA_DSC_REG_URL"),
            dsc_reg_key: get("AA_DSC_REG_KEY").map(Secret::from),
            dsc_node_config_name: get("AA_DSC_NODE_CONFIG_NAME"),
            ..Default::default()
        }
    }

    /// Merge the layers in precedence order.
    pub fn resolve(flags: ConfigLayer, env: ConfigLayer, file: Option<FileConfig>) -> Self {
        let file = file.map(ConfigLayer::from).unwrap_or_default();
        flags.or(env).or(file)
    }

    /// Names derived from the resolved app and environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` if either is unset.
    pub fn names(&self) -> Result<EnvironmentNames> {
        let app = self
            .app
            .as_deref()
            .ok_or(ConfigError::MissingField { field: "app" })?;
        let environment = self
            .environment
            .as_deref()
            .ok_or(ConfigError::MissingField { field: "environment" })?;
        Ok(EnvironmentNames::resolve(app, environment))
    }

    /// Provider credentials. Only needed when talking to the real cloud.
    pub fn credentials(&self) -> Result<Credentials> {
        let username = self
            .username
            .clone()
            .ok_or(ConfigError::MissingField { field: "username (OS_USERNAME)" })?;
        let api_key = self
            .api_key
            .clone()
            .ok_or(ConfigError::MissingField { field: "api key (OS_API_KEY)" })?;
        Ok(Credentials {
            username,
            api_key,
            region: self.region().to_string(),
            auth_url: self
                .auth_url
                .clone()
                .unwrap_or_else(|| constants::DEFAULT_AUTH_URL.to_string()),
        })
    }

    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(constants::DEFAULT_REGION)
    }

    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or(constants::DEFAULT_ROLE)
    }

    pub fn policy_name(&self) -> &str {
        self.policy_name
            .as_deref()
            .unwrap_or(constants::DEFAULT_SCALE_POLICY)
    }

    pub fn image_name(&self) -> &str {
        self.image_name
            .as_deref()
            .unwrap_or(constants::DEFAULT_IMAGE_NAME)
    }

    /// Base domain, if one is configured.
    pub fn domain(&self) -> Option<&str> {
        self.domain_name.as_deref().filter(|d| !d.is_empty())
    }

    /// Convergence wait policy; `None` when waiting is disabled.
    pub fn poll_policy(&self, wait: bool) -> Result<Option<PollPolicy>> {
        if !wait {
            return Ok(None);
        }
        let interval = self
            .poll_interval_secs
            .unwrap_or(constants::POLL_INTERVAL_SECS);
        if interval == 0 || interval > constants::POLL_INTERVAL_LIMIT_SECS {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval",
                reason: format!(
                    "must be between 1 and {} seconds, got {}",
                    constants::POLL_INTERVAL_LIMIT_SECS,
                    interval
                ),
            }
            .into());
        }
        let backoff = self.poll_backoff.unwrap_or(constants::POLL_BACKOFF);
        if !backoff.is_finite() || backoff < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_backoff",
                reason: format!("must be a number >= 1.0, got {}", backoff),
            }
            .into());
        }
        let timeout = match self.wait_timeout_secs.unwrap_or(constants::WAIT_TIMEOUT_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Ok(Some(PollPolicy {
            interval: Duration::from_secs(interval),
            timeout,
            backoff,
            max_interval: Duration::from_secs(constants::POLL_MAX_INTERVAL_SECS.max(interval)),
        }))
    }

    /// Settings for `create`.
    pub fn create_settings(&self) -> Result<CreateSettings> {
        let bootstrap_type = self
            .bootstrap_type
            .clone()
            .unwrap_or_else(|| constants::DEFAULT_BOOTSTRAP_TYPE.to_string());
        if bootstrap_type != "dsc" && bootstrap_type != "chef" {
            return Err(ConfigError::InvalidValue {
                field: "bootstrap_type",
                reason: format!("expected 'dsc' or 'chef', got '{}'", bootstrap_type),
            }
            .into());
        }

        Ok(CreateSettings {
            names: self.names()?,
            domain_name: self.domain().map(str::to_string),
            bootstrap_type,
            initial_policy: self
                .initial_policy
                .clone()
                .unwrap_or_else(|| constants::DEFAULT_INITIAL_POLICY.to_string()),
            node_username: self
                .node_username
                .clone()
                .unwrap_or_else(|| constants::DEFAULT_NODE_USERNAME.to_string()),
            node_password: self
                .node_password
                .clone()
                .unwrap_or_else(|| Secret::new(constants::DEFAULT_NODE_PASSWORD)),
            image_name: self.image_name().to_string(),
            flavor_id: self
                .flavor_id
                .clone()
                .unwrap_or_else(|| constants::DEFAULT_FLAVOR_ID.to_string()),
            base_script_url: self
                .base_script_url
                .clone()
                .unwrap_or_else(|| constants::DEFAULT_BASE_SCRIPT_URL.to_string()),
            setup_url: self
                .setup_url
                .clone()
                .unwrap_or_else(|| constants::DEFAULT_SETUP_URL.to_string()),
            api_token: self.api_token.clone(),
            rackspace_username: self.username.clone(),
            dsc: DscRegistration {
                reg_url: self.dsc_reg_url.clone(),
                reg_key: self.dsc_reg_key.clone(),
                node_config_name: self.dsc_node_config_name.clone(),
            },
            personality_dir: self
                .personality_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(constants::PERSONALITY_DIR)),
        })
    }
}

/// Identity API credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub api_key: Secret,
    pub region: String,
    pub auth_url: String,
}

/// Azure Automation DSC registration parameters, passed through to the
/// bootstrap templates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DscRegistration {
    pub reg_url: Option<String>,
    pub reg_key: Option<Secret>,
    pub node_config_name: Option<String>,
}

/// Fully resolved settings for creating an environment.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSettings {
    pub names: EnvironmentNames,
    pub domain_name: Option<String>,
    pub bootstrap_type: String,
    pub initial_policy: String,
    pub node_username: String,
    pub node_password: Secret,
    pub image_name: String,
    pub flavor_id: String,
    pub base_script_url: String,
    pub setup_url: String,
    pub api_token: Option<Secret>,
    pub rackspace_username: Option<String>,
    pub dsc: DscRegistration,
    pub personality_dir: PathBuf,
}

/// Contents of a `stagehand.toml` file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub region: Option<String>,
    pub auth_url: Option<String>,
    pub app: Option<String>,
    pub environment: Option<String>,
    pub role: Option<String>,
    pub domain_name: Option<String>,
    pub bootstrap_type: Option<String>,
    pub initial_policy: Option<String>,
    pub node_username: Option<String>,
    pub image_name: Option<String>,
    pub flavor_id: Option<String>,
    pub base_script_url: Option<String>,
    pub setup_url: Option<String>,
    pub dsc_reg_url: Option<String>,
    pub dsc_node_config_name: Option<String>,
    pub personality_dir: Option<PathBuf>,
    pub policy_name: Option<String>,
    pub wait_timeout_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
    pub poll_backoff: Option<f64>,
}

impl From<FileConfig> for ConfigLayer {
    fn from(f: FileConfig) -> Self {
        ConfigLayer {
            region: f.region,
            auth_url: f.auth_url,
            app: f.app,
            environment: f.environment,
            role: f.role,
            domain_name: f.domain_name,
            bootstrap_type: f.bootstrap_type,
            initial_policy: f.initial_policy,
            node_username: f.node_username,
            image_name: f.image_name,
            flavor_id: f.flavor_id,
            base_script_url: f.base_script_url,
            setup_url: f.setup_url,
            dsc_reg_url: f.dsc_reg_url,
            dsc_node_config_name: f.dsc_node_config_name,
            personality_dir: f.personality_dir,
            policy_name: f.policy_name,
            wait_timeout_secs: f.wait_timeout_secs,
            poll_interval_secs: f.poll_interval_secs,
            poll_backoff: f.poll_backoff,
            ..Default::default()
        }
    }
}

impl FileConfig {
    /// Parse a config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` or `ConfigError::Parse`.
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config file");
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        Ok(config)
    }

    /// Load the config file, if any.
    ///
    /// An explicit path must exist. Otherwise `./stagehand.toml` is tried,
    /// then the user config directory; neither is required.
    pub fn discover(explicit: Option<&Path>) -> Result<Option<Self>> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.to_path_buf()).into());
            }
            return Self::from_path(path).map(Some);
        }

        let local = PathBuf::from(constants::CONFIG_FILE);
        if local.exists() {
            return Self::from_path(&local).map(Some);
        }

        if let Some(dir) = dirs::config_dir() {
            let user = dir.join(constants::CONFIG_DIR).join("config.toml");
            if user.exists() {
                return Self::from_path(&user).map(Some);
            }
        }

        debug!("no config file found");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> ConfigLayer {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigLayer::from_env_with(|k| map.get(k).cloned())
    }

    #[test]
    fn test_flag_beats_env_beats_file() {
        let flags = ConfigLayer {
            domain_name: Some("flag.example".into()),
            ..Default::default()
        };
        let env = env(&[("DOMAIN_NAME", "env.example"), ("NAMESPACE", "envapp")]);
        let file = FileConfig {
            domain_name: Some("file.example".into()),
            app: Some("fileapp".into()),
            environment: Some("prd".into()),
            ..Default::default()
        };

        let resolved = ConfigLayer::resolve(flags, env, Some(file));
        assert_eq!(resolved.domain(), Some("flag.example"));
        assert_eq!(resolved.app.as_deref(), Some("envapp"));
        assert_eq!(resolved.environment.as_deref(), Some("prd"));
    }

    #[test]
    fn test_flag_password_beats_env_password() {
        let flags = ConfigLayer {
            node_password: Some(Secret::new("from-flag")),
            app: Some("win".into()),
            environment: Some("stg".into()),
            ..Default::default()
        };
        let env = env(&[("NODE_PASSWORD", "from-env")]);
        let settings = ConfigLayer::resolve(flags, env, None)
            .create_settings()
            .unwrap();
        assert_eq!(settings.node_password.expose(), "from-flag");
    }

    #[test]
    fn test_empty_env_is_unset() {
        let layer = env(&[("DOMAIN_NAME", ""), ("OS_REGION", "")]);
        assert!(layer.domain_name.is_none());
        assert_eq!(layer.region(), "LON");
    }

    #[test]
    fn test_defaults() {
        let layer = ConfigLayer {
            app: Some("win".into()),
            environment: Some("stg".into()),
            ..Default::default()
        };
        let settings = layer.create_settings().unwrap();
        assert_eq!(settings.names.group, "win-stg");
        assert_eq!(settings.bootstrap_type, "dsc");
        assert_eq!(settings.initial_policy, "Set to 2");
        assert_eq!(settings.node_username, "localadmin");
        assert_eq!(settings.image_name, "Windows Server 2012 R2");
        assert_eq!(settings.flavor_id, "general1-2");
        assert_eq!(settings.personality_dir, PathBuf::from("./bootstrap/personality"));
        assert!(settings.domain_name.is_none());
        assert_eq!(layer.role(), "web");
        assert_eq!(layer.policy_name(), "Set to 2");
    }

    #[test]
    fn test_missing_app_is_error() {
        let layer = ConfigLayer {
            environment: Some("stg".into()),
            ..Default::default()
        };
        match layer.names().unwrap_err() {
            Error::Config(ConfigError::MissingField { field }) => assert_eq!(field, "app"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_bootstrap_type() {
        let layer = ConfigLayer {
            app: Some("win".into()),
            environment: Some("stg".into()),
            bootstrap_type: Some("puppet".into()),
            ..Default::default()
        };
        assert!(layer.create_settings().is_err());
    }

    #[test]
    fn test_credentials() {
        let layer = env(&[("OS_USERNAME", "demo"), ("OS_API_KEY", "k3y"), ("OS_REGION", "dfw")]);
        let creds = layer.credentials().unwrap();
        assert_eq!(creds.username, "demo");
        assert_eq!(creds.api_key.expose(), "k3y");
        assert_eq!(creds.region, "dfw");
        assert_eq!(creds.auth_url, constants::DEFAULT_AUTH_URL);

        assert!(env(&[("OS_USERNAME", "demo")]).credentials().is_err());
    }

    #[test]
    fn test_poll_policy() {
        let layer = ConfigLayer::default();
        let policy = layer.poll_policy(true).unwrap().unwrap();
        assert_eq!(policy.interval, Duration::from_secs(10));
        assert_eq!(policy.timeout, Some(Duration::from_secs(1800)));
        assert_eq!(policy.backoff, 1.0);

        assert!(layer.poll_policy(false).unwrap().is_none());

        let unbounded = ConfigLayer {
            wait_timeout_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(unbounded.poll_policy(true).unwrap().unwrap().timeout, None);

        let bad = ConfigLayer {
            poll_backoff: Some(0.5),
            ..Default::default()
        };
        assert!(bad.poll_policy(true).is_err());

        let huge = ConfigLayer {
            poll_interval_secs: Some(u64::MAX),
            ..Default::default()
        };
        assert!(matches!(
            huge.poll_policy(true),
            Err(Error::Config(ConfigError::InvalidValue { field: "poll_interval", .. }))
        ));
    }

    #[test]
    fn test_file_config_parse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stagehand.toml");
        std::fs::write(
            &path,
            "app = \"win\"\nenvironment = \"stg\"\ndomain_name = \"example.com\"\nwait_timeout_secs = 600\n",
        )
        .unwrap();

        let file = FileConfig::discover(Some(&path)).unwrap().unwrap();
        assert_eq!(file.app.as_deref(), Some("win"));
        assert_eq!(file.wait_timeout_secs, Some(600));
    }

    #[test]
    fn test_file_config_rejects_secrets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stagehand.toml");
        std::fs::write(&path, "node_password = \"hunter2\"\n").unwrap();

        assert!(matches!(
            FileConfig::from_path(&path),
            Err(Error::Config(ConfigError::Parse(_)))
        ));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            FileConfig::discover(Some(&missing)),
            Err(Error::Config(ConfigError::FileNotFound(_)))
        ));
    }
}
