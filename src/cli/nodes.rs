//! Nodes command.

use crate::cli::{output, print_json, Context};
use crate::core::lifecycle;
use crate::error::Result;

/// List the environment's servers for the configured role.
pub fn execute(ctx: &Context) -> Result<()> {
    let names = ctx.config.names()?;
    let role = ctx.config.role();
    let provider = ctx.provider()?;

    let nodes = lifecycle::list_nodes(provider.as_ref(), &names, role)?;
    if nodes.is_empty() {
        output::dimmed(&format!("no {} nodes in {}", role, names.group));
    } else {
        output::header(&format!("{} {} nodes in {}", nodes.len(), role, names.group));
        for node in &nodes {
            output::list_item(&format!(
                "{}  {}",
                node.name,
                node.ip.as_deref().unwrap_or("-")
            ));
        }
    }

    print_json(&nodes)
}
