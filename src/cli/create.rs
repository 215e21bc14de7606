//! Create command.

use crate::cli::{output, print_json, Context};
use crate::core::dns::DnsSync;
use crate::core::lifecycle::{self, CreateReport};
use crate::core::poller::SystemClock;
use crate::error::Result;

/// Provision an environment and print the report.
pub fn execute(ctx: &Context, no_wait: bool) -> Result<()> {
    let settings = ctx.config.create_settings()?;
    let wait = ctx.config.poll_policy(!no_wait)?;
    let provider = ctx.provider()?;

    output::section(&format!("Environment {}", settings.names.group));
    output::kv("provider", provider.name());
    output::kv("region", ctx.config.region());
    output::kv("image", &settings.image_name);
    if let Some(policy) = &wait {
        let timeout = policy
            .timeout
            .map(|t| format!("{}s", t.as_secs()))
            .unwrap_or_else(|| "none".to_string());
        output::kv("wait timeout", timeout);
    }

    let report =
        lifecycle::create_environment(provider.as_ref(), &settings, wait.as_ref(), &SystemClock)?;

    summarize(&report);
    print_json(&report)
}

fn summarize(report: &CreateReport) {
    eprintln!();
    output::success(&format!("load balancer {}", output::name(&report.load_balancer.name)));
    for ip in report.load_balancer.public_ipv4() {
        output::list_item(ip);
    }

    match &report.dns {
        Some(DnsSync::Synced { fqdn, records, .. }) => {
            output::success(&format!("dns {} ({} records)", output::name(fqdn), records.len()));
        }
        Some(DnsSync::DomainNotFound { domain }) => {
            output::warn(&format!("dns domain {} not found; no records created", domain));
        }
        None => output::dimmed("no domain configured; dns skipped"),
    }

    output::success(&format!("scaling group {}", output::name(&report.name)));
    for p in &report.personality {
        output::list_item(&format!("{} ({} bytes, sha256 {})", p.path, p.bytes, &p.sha256[..12]));
    }
    output::success(&format!("{} policies", report.policies.policies.len()));
    if let Some(executed) = &report.policies.executed {
        output::kv("executed", executed);
    }

    match &report.state {
        Some(done) => output::success(&format!(
            "converged: {} active after {} polls ({}s)",
            done.state.active_capacity,
            done.polls,
            done.elapsed.as_secs()
        )),
        None => output::dimmed("not waiting for convergence"),
    }
    output::rule();
}
