//! Policies command.

use serde::Serialize;

use crate::cli::print_json;
use crate::core::policy::{Adjustment, CATALOG};
use crate::error::Result;

#[derive(Serialize)]
struct CatalogEntry {
    name: &'static str,
    webhook: String,
    #[serde(flatten)]
    adjustment: Adjustment,
}

/// Print the policy catalog every environment is created with.
pub fn execute() -> Result<()> {
    let entries: Vec<CatalogEntry> = CATALOG
        .iter()
        .map(|p| CatalogEntry {
            name: p.name,
            webhook: p.webhook_name(),
            adjustment: p.adjustment,
        })
        .collect();
    print_json(&entries)
}
