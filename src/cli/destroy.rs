//! Destroy command.

use std::io::{self, IsTerminal};

use dialoguer::Confirm;

use crate::cli::{output, print_json, Context};
use crate::core::lifecycle::{self, Removal};
use crate::error::{ConfigError, Result};

/// Tear down the environment after confirmation.
pub fn execute(ctx: &Context, yes: bool) -> Result<()> {
    let names = ctx.config.names()?;
    let domain = ctx.config.domain();

    if !yes {
        if !io::stdin().is_terminal() {
            return Err(ConfigError::ConfirmationRequired.into());
        }
        eprintln!();
        eprintln!("The following resources will be deleted:");
        output::list_item(&format!("scaling group {}", names.group));
        output::list_item(&format!("load balancer {}", names.load_balancer));
        if let Some(domain) = domain {
            output::list_item(&format!("dns records for {}", names.fqdn(domain)));
        }
        eprintln!();

        let confirmed = Confirm::new()
            .with_prompt(format!("Destroy {}?", names.group))
            .default(false)
            .interact()?;
        if !confirmed {
            return Err(ConfigError::Aborted.into());
        }
    }

    let provider = ctx.provider()?;
    let report = lifecycle::teardown(provider.as_ref(), &names, domain)?;

    show("scaling group", &names.group, &report.scaling_groups);
    show("load balancer", &names.load_balancer, &report.load_balancers);
    if let (Some(domain), Some(records)) = (domain, &report.dns_records) {
        show("dns records", &names.fqdn(domain), records);
    }
    if report.is_empty() {
        output::dimmed("nothing to destroy");
    }

    print_json(&report)
}

fn show(kind: &str, name: &str, removal: &Removal) {
    match removal {
        Removal::Deleted { ids } => {
            output::success(&format!("deleted {} {} ({})", kind, output::name(name), ids.len()));
        }
        Removal::NotFound => output::warn(&format!("no {} {} found", kind, name)),
    }
}
