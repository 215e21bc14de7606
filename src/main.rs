//! Stagehand - Rackspace demo environment lifecycle orchestrator.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stagehand::cli::output;
use stagehand::cli::{execute, Cli};
use stagehand::core::constants::LOG_ENV;
use stagehand::error::{ConfigError, Error};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("stagehand=debug")
        } else {
            EnvFilter::new("stagehand=info")
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    if let Err(e) = execute(cli) {
        // Format error with suggestion if available
        let error_msg = e.to_string();
        let suggestion = match &e {
            Error::Config(ConfigError::MissingField { field })
                if field.starts_with("username") || field.starts_with("api key") =>
            {
                Some("set OS_USERNAME and OS_API_KEY, or pass --dry-run")
            }
            Error::Config(ConfigError::MissingField { .. }) => {
                Some("pass APP and ENVIRONMENT, or set NAMESPACE and ENVIRONMENT")
            }
            Error::Config(ConfigError::ImageNotFound(_)) => Some("check --image-name"),
            Error::Config(ConfigError::ConfirmationRequired) => Some("pass --yes"),
            Error::Template(_) => Some("check --personality-dir"),
            Error::Convergence(_) => Some("the environment was left in place; run: stagehand destroy"),
            _ => None,
        };

        output::error(&error_msg);
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
