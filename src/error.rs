//! Error types.
//!
//! Errors are grouped by where they come from: configuration, personality
//! templates, the cloud provider, and the convergence wait. "Nothing to do"
//! conditions (no matching group, policy, or record) are not errors; they are
//! reported through result types in `core::lifecycle`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Convergence(#[from] ConvergenceError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("{0}")]
    Other(String),
}

/// Configuration errors. These abort before any cloud resource is touched.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required value: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("config file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot find OS image {0}")]
    ImageNotFound(String),

    #[error("confirmation required: pass --yes to run non-interactively")]
    ConfirmationRequired,

    #[error("aborted by user")]
    Aborted,
}

/// Personality template errors.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("cannot read personality template {}: {source}", path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by a cloud provider client.
///
/// These propagate straight out of the orchestration: resources created
/// earlier in the same run are left in place.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("no {service} endpoint in region {region}")]
    MissingEndpoint { service: String, region: String },

    #[error("{method} {url} failed with status {status}: {message}")]
    Http {
        method: String,
        url: String,
        status: u16,
        message: String,
    },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("simulated failure in {0}")]
    Simulated(String),
}

/// Convergence wait failures.
#[derive(Error, Debug)]
pub enum ConvergenceError {
    #[error("scaling group {group} pending capacity went to zero, but no active nodes")]
    NoActiveCapacity { group: String },

    #[error(
        "scaling group {group} did not converge within {}s ({pending} pending)",
        .elapsed.as_secs()
    )]
    TimedOut {
        group: String,
        elapsed: Duration,
        pending: u32,
    },
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Transport(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Provider(e.into())
    }
}

/// Result alias.
pub type Result<T> = std::result::Result<T, Error>;
