//! DNS record synchronization.
//!
//! The environment's subdomain points at the load balancer's public IPv4
//! addresses. Existing records with the same name are deleted first, then
//! fresh A records are added. The two steps are separate API calls: a crash
//! in between leaves the name without records.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::constants::DNS_TTL;
use crate::core::domain::{DnsRecord, LoadBalancer, NewRecord};
use crate::core::naming::EnvironmentNames;
use crate::core::provider::{find_domain, CloudProvider};
use crate::core::types::ResourceId;
use crate::error::Result;

/// Result of a DNS sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DnsSync {
    Synced {
        domain_id: String,
        fqdn: String,
        removed: usize,
        records: Vec<DnsRecord>,
    },
    /// No DNS domain with the configured name exists in the account.
    DomainNotFound { domain: String },
}

/// Replace the records for `names` under `domain` with A records for the
/// load balancer's public IPv4 addresses.
pub fn sync_records(
    provider: &dyn CloudProvider,
    domain: &str,
    names: &EnvironmentNames,
    lb: &LoadBalancer,
) -> Result<DnsSync> {
    let fqdn = names.fqdn(domain);
    let records: Vec<NewRecord> = lb
        .public_ipv4()
        .map(|ip| NewRecord::a(&fqdn, ip, DNS_TTL))
        .collect();

    let Some(dom) = find_domain(provider, domain)? else {
        warn!(domain, "dns domain not found; skipping records");
        return Ok(DnsSync::DomainNotFound {
            domain: domain.to_string(),
        });
    };

    let removed = delete_matching(provider, &dom.id, &fqdn)?.len();

    info!(fqdn = %fqdn, count = records.len(), "adding dns records");
    let added = if records.is_empty() {
        Vec::new()
    } else {
        provider.add_records(&dom.id, &records)?
    };

    Ok(DnsSync::Synced {
        domain_id: dom.id,
        fqdn,
        removed,
        records: added,
    })
}

/// Delete every record for `names` under `domain`.
///
/// Returns `None` if the domain does not exist, otherwise the ids of the
/// deleted records.
pub fn remove_records(
    provider: &dyn CloudProvider,
    domain: &str,
    names: &EnvironmentNames,
) -> Result<Option<Vec<ResourceId>>> {
    let Some(dom) = find_domain(provider, domain)? else {
        return Ok(None);
    };
    delete_matching(provider, &dom.id, &names.fqdn(domain)).map(Some)
}

fn delete_matching(
    provider: &dyn CloudProvider,
    domain_id: &str,
    fqdn: &str,
) -> Result<Vec<ResourceId>> {
    let mut removed = Vec::new();
    for record in provider.list_records(domain_id)? {
        if record.name == fqdn {
            debug!(
                name = %record.name,
                kind = %record.record_type,
                data = %record.data,
                "deleting dns record"
            );
            provider.delete_record(domain_id, &record.id)?;
            removed.push(record.id);
        }
    }
    Ok(removed)
}
