//! Scale command.

use crate::cli::{output, print_json, Context};
use crate::core::lifecycle::{self, ScaleOutcome};
use crate::error::{Error, Result};

/// Execute a scaling policy on the environment's group.
///
/// A missing group or policy is a warning unless `strict` is set.
pub fn execute(ctx: &Context, strict: bool) -> Result<()> {
    let names = ctx.config.names()?;
    let policy_name = ctx.config.policy_name();
    let provider = ctx.provider()?;

    output::progress(&format!("Executing {} on {}", policy_name, names.group));
    let outcome = lifecycle::scale(provider.as_ref(), &names, policy_name)?;
    output::progress_done(outcome.is_executed());

    match &outcome {
        ScaleOutcome::Executed { policy_id, .. } => output::kv("policy id", policy_id),
        ScaleOutcome::GroupNotFound { group } => {
            output::warn(&format!("scaling group {} not found", output::name(group)));
        }
        ScaleOutcome::PolicyNotFound { available, .. } => {
            output::warn(&format!("policy {} not found; available:", output::name(policy_name)));
            for name in available {
                output::list_item(name);
            }
        }
    }

    print_json(&outcome)?;

    if strict && !outcome.is_executed() {
        return Err(Error::Other(match outcome {
            ScaleOutcome::GroupNotFound { group } => format!("scaling group {} not found", group),
            _ => format!("policy {} not found on {}", policy_name, names.group),
        }));
    }
    Ok(())
}
