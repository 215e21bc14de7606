//! Command-line interface.

pub mod create;
pub mod destroy;
pub mod nodes;
pub mod output;
pub mod policies;
pub mod scale;

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use crate::core::config::{ConfigLayer, FileConfig};
use crate::core::provider::{CloudProvider, RackspaceProvider, SimulatedCloud};
use crate::core::types::Secret;
use crate::error::Result;

/// Stagehand - Rackspace demo environment lifecycle orchestrator.
#[derive(Parser, Debug)]
#[command(
    name = "stagehand",
    about = "Provision, scale, query and tear down Windows autoscaling demo environments",
    version,
    after_help = "Set STAGEHAND_LOG to control log output (e.g. STAGEHAND_LOG=stagehand=trace)."
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Config file (default: ./stagehand.toml, then the user config dir)
    #[arg(long, global = true, value_name = "PATH", env = "STAGEHAND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cloud region [env: OS_REGION]
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Cloud account username [env: OS_USERNAME]
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Cloud account API key [env: OS_API_KEY]
    #[arg(long, global = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Run against an in-memory cloud; nothing is created for real
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            region: self.region.clone(),
            username: self.username.clone(),
            api_key: self.api_key.clone().map(Secret::from),
            ..Default::default()
        }
    }
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an environment: load balancer, DNS, scaling group and policies
    Create(CreateArgs),

    /// Execute a scaling policy on an environment
    Scale(ScaleArgs),

    /// Delete an environment's scaling group, load balancer and DNS records
    Destroy(DestroyArgs),

    /// List an environment's servers
    Nodes(NodesArgs),

    /// Print the scaling policy catalog
    Policies,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// App and environment, shared by every environment command.
#[derive(Args, Debug, Default, Clone)]
pub struct Target {
    /// Application name [env: NAMESPACE]
    pub app: Option<String>,
    /// Environment name, e.g. stg or prd [env: ENVIRONMENT]
    pub environment: Option<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct CreateArgs {
    #[command(flatten)]
    pub target: Target,

    /// Node bootstrap mechanism (dsc or chef)
    #[arg(long)]
    pub bootstrap_type: Option<String>,

    /// Policy executed right after creation
    #[arg(long, value_name = "POLICY")]
    pub initial_policy: Option<String>,

    /// Local administrator on each node
    #[arg(long)]
    pub node_username: Option<String>,

    /// Local administrator password [env: NODE_PASSWORD]
    #[arg(long)]
    pub node_password: Option<String>,

    /// Server image, matched by exact name
    #[arg(long)]
    pub image_name: Option<String>,

    /// Server flavor
    #[arg(long)]
    pub flavor_id: Option<String>,

    /// Base DNS domain; no records are managed when unset [env: DOMAIN_NAME]
    #[arg(long)]
    pub domain_name: Option<String>,

    /// Where nodes fetch their bootstrap scripts
    #[arg(long, value_name = "URL")]
    pub base_script_url: Option<String>,

    /// Setup service URL
    #[arg(long, value_name = "URL")]
    pub setup_url: Option<String>,

    /// Setup service token [env: SETUP_API_TOKEN]
    #[arg(long)]
    pub api_token: Option<String>,

    /// Azure Automation DSC registration URL [env: AA_DSC_REG_URL]
    #[arg(long, value_name = "URL")]
    pub aa_dsc_reg_url: Option<String>,

    /// Azure Automation DSC registration key [env: AA_DSC_REG_KEY]
    #[arg(long, value_name = "KEY")]
    pub aa_dsc_reg_key: Option<String>,

    /// Azure Automation DSC node configuration [env: AA_DSC_NODE_CONFIG_NAME]
    #[arg(long, value_name = "NAME")]
    pub aa_dsc_node_config_name: Option<String>,

    /// Directory holding the personality templates
    #[arg(long, value_name = "DIR")]
    pub personality_dir: Option<PathBuf>,

    /// Return as soon as the policies are in place
    #[arg(long)]
    pub no_wait: bool,

    /// Give up waiting after this many seconds (0 waits forever)
    #[arg(long, value_name = "SECS")]
    pub wait_timeout: Option<u64>,

    /// Seconds between group state polls
    #[arg(long, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Multiply the poll interval by this after every poll
    #[arg(long, value_name = "FACTOR")]
    pub poll_backoff: Option<f64>,
}

impl CreateArgs {
    fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            app: self.target.app.clone(),
            environment: self.target.environment.clone(),
            bootstrap_type: self.bootstrap_type.clone(),
            initial_policy: self.initial_policy.clone(),
            node_username: self.node_username.clone(),
            node_password: self.node_password.clone().map(Secret::from),
            image_name: self.image_name.clone(),
            flavor_id: self.flavor_id.clone(),
            domain_name: self.domain_name.clone(),
            base_script_url: self.base_script_url.clone(),
            setup_url: self.setup_url.clone(),
            api_token: self.api_token.clone().map(Secret::from),
            dsc_reg_url: self.aa_dsc_reg_url.clone(),
            dsc_reg_key: self.aa_dsc_reg_key.clone().map(Secret::from),
            dsc_node_config_name: self.aa_dsc_node_config_name.clone(),
            personality_dir: self.personality_dir.clone(),
            wait_timeout_secs: self.wait_timeout,
            poll_interval_secs: self.poll_interval,
            poll_backoff: self.poll_backoff,
            ..Default::default()
        }
    }
}

#[derive(Args, Debug, Default, Clone)]
pub struct ScaleArgs {
    #[command(flatten)]
    pub target: Target,

    /// Policy to execute
    #[arg(long, value_name = "POLICY")]
    pub policy_name: Option<String>,

    /// Fail if the group or policy does not exist
    #[arg(long)]
    pub strict: bool,
}

impl ScaleArgs {
    fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            app: self.target.app.clone(),
            environment: self.target.environment.clone(),
            policy_name: self.policy_name.clone(),
            ..Default::default()
        }
    }
}

#[derive(Args, Debug, Default, Clone)]
pub struct DestroyArgs {
    #[command(flatten)]
    pub target: Target,

    /// Base DNS domain whose records are removed [env: DOMAIN_NAME]
    #[arg(long)]
    pub domain_name: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl DestroyArgs {
    fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            app: self.target.app.clone(),
            environment: self.target.environment.clone(),
            domain_name: self.domain_name.clone(),
            ..Default::default()
        }
    }
}

#[derive(Args, Debug, Default, Clone)]
pub struct NodesArgs {
    #[command(flatten)]
    pub target: Target,

    /// Server role [env: ROLE]
    pub role: Option<String>,
}

impl NodesArgs {
    fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            app: self.target.app.clone(),
            environment: self.target.environment.clone(),
            role: self.role.clone(),
            ..Default::default()
        }
    }
}

/// Resolved settings plus the provider choice for one run.
#[derive(Debug)]
pub struct Context {
    pub config: ConfigLayer,
    pub dry_run: bool,
}

impl Context {
    /// Resolve `flags` against the environment and the config file.
    pub fn load(config_path: Option<&std::path::Path>, flags: ConfigLayer, dry_run: bool) -> Result<Self> {
        let file = FileConfig::discover(config_path)?;
        let config = ConfigLayer::resolve(flags, ConfigLayer::from_env(), file);
        debug!(dry_run, region = config.region(), "resolved configuration");
        Ok(Self { config, dry_run })
    }

    /// The cloud to run against.
    ///
    /// Dry runs get an in-memory cloud holding the configured image and
    /// domain, so `create` can run end to end.
    pub fn provider(&self) -> Result<Box<dyn CloudProvider>> {
        if self.dry_run {
            let mut cloud = SimulatedCloud::new().with_image(self.config.image_name());
            if let Some(domain) = self.config.domain() {
                cloud = cloud.with_domain(domain);
            }
            return Ok(Box::new(cloud));
        }
        let credentials = self.config.credentials()?;
        Ok(Box::new(RackspaceProvider::connect(&credentials)?))
    }
}

/// Print a command result as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Write the completion script for `shell` to `out`.
pub fn write_completions(shell: clap_complete::Shell, out: &mut dyn std::io::Write) {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, bin, out);
}

/// Execute a command.
pub fn execute(cli: Cli) -> Result<()> {
    let flags = cli.layer();
    let config_path = cli.config.as_deref();
    let dry_run = cli.dry_run;

    match &cli.command {
        Command::Create(args) => {
            let ctx = Context::load(config_path, args.layer().or(flags), dry_run)?;
            create::execute(&ctx, args.no_wait)
        }
        Command::Scale(args) => {
            let ctx = Context::load(config_path, args.layer().or(flags), dry_run)?;
            scale::execute(&ctx, args.strict)
        }
        Command::Destroy(args) => {
            let ctx = Context::load(config_path, args.layer().or(flags), dry_run)?;
            destroy::execute(&ctx, args.yes)
        }
        Command::Nodes(args) => {
            let ctx = Context::load(config_path, args.layer().or(flags), dry_run)?;
            nodes::execute(&ctx)
        }
        Command::Policies => policies::execute(),
        Command::Completions { shell } => {
            write_completions(*shell, &mut std::io::stdout());
            Ok(())
        }
    }
}
