//! Environment lifecycle operations.
//!
//! These are the entry points the CLI calls: create, teardown, scale and
//! node listing. Each takes the provider by reference and returns a
//! serializable report. Not-found conditions in teardown and scale are
//! reported as result variants, never as errors.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::config::CreateSettings;
use crate::core::dns::{self, DnsSync};
use crate::core::domain::LoadBalancer;
use crate::core::naming::EnvironmentNames;
use crate::core::personality::{self, PersonalitySource, PersonalitySummary};
use crate::core::poller::{self, Clock, Converged, PollPolicy};
use crate::core::provider::{find_group, find_image, CloudProvider};
use crate::core::provisioner::{self, PolicySet};
use crate::core::template::TemplateVars;
use crate::core::types::{Metadata, ResourceId};
use crate::error::{ConfigError, Result};

/// Variables exposed to personality templates.
pub fn template_vars(settings: &CreateSettings) -> TemplateVars {
    let names = &settings.names;
    let mut vars = TemplateVars::new();
    vars.set("bootstrap_type", &settings.bootstrap_type)
        .set("base_script_url", &settings.base_script_url)
        .set("setup_url", &settings.setup_url)
        .set_secret("api_token", settings.api_token.as_ref())
        .set_opt("rackspace_username", settings.rackspace_username.as_deref())
        .set("app_name", &names.app)
        .set("environment_name", &names.environment)
        .set("asg_name", &names.group)
        .set("lb_name", &names.load_balancer)
        .set_opt("domain_name", settings.domain_name.as_deref())
        .set("subdomain_name", &names.subdomain)
        .set("node_base_name", &names.node_base)
        .set("node_username", &settings.node_username)
        .set_secret("node_password", Some(&settings.node_password))
        .set_opt("aa_dsc_reg_url", settings.dsc.reg_url.as_deref())
        .set_secret("aa_dsc_reg_key", settings.dsc.reg_key.as_ref())
        .set_opt(
            "aa_dsc_node_config_name",
            settings.dsc.node_config_name.as_deref(),
        );
    vars
}

/// Result of `create`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateReport {
    /// Scaling group id
    pub id: ResourceId,
    /// Scaling group name
    pub name: String,
    pub metadata: Metadata,
    pub load_balancer: LoadBalancer,
    /// `None` when no domain is configured
    pub dns: Option<DnsSync>,
    pub policies: PolicySet,
    pub personality: Vec<PersonalitySummary>,
    /// `None` when the wait was skipped
    pub state: Option<Converged>,
    pub created_at: DateTime<Utc>,
}

/// Build a complete environment.
///
/// Order: image lookup, personality rendering, load balancer, DNS records,
/// scaling group, policies and webhooks (executing the initial policy), then
/// the convergence wait if `wait` is set.
///
/// # Errors
///
/// - `ConfigError::ImageNotFound` if no image has the configured name
/// - `TemplateError::ReadSource` if a personality template is unreadable
/// - any provider error; resources created before it are left in place
/// - `ConvergenceError` from the wait
pub fn create_environment(
    provider: &dyn CloudProvider,
    settings: &CreateSettings,
    wait: Option<&PollPolicy>,
    clock: &dyn Clock,
) -> Result<CreateReport> {
    let names = &settings.names;
    info!(
        provider = provider.name(),
        group = %names.group,
        "creating environment"
    );

    let image = find_image(provider, &settings.image_name)?
        .ok_or_else(|| ConfigError::ImageNotFound(settings.image_name.clone()))?;
    debug!(image = %image.name, id = %image.id, "resolved image");

    let vars = template_vars(settings);
    debug!(vars = ?vars.redacted(), "template variables");
    let sources = PersonalitySource::defaults(&settings.personality_dir);
    let personality = personality::render_all(&sources, &vars)?;
    let summaries = personality.iter().map(|p| p.summary()).collect();

    let lb = provisioner::create_load_balancer(provider, names)?;

    let dns = match settings.domain_name.as_deref() {
        Some(domain) => Some(dns::sync_records(provider, domain, names, &lb)?),
        None => None,
    };

    let metadata = provisioner::environment_metadata(names, &settings.bootstrap_type);
    let group = provisioner::create_group(
        provider,
        names,
        &image,
        &settings.flavor_id,
        metadata.clone(),
        personality,
        &lb,
    )?;
    let policies = provisioner::attach_policies(provider, &group, Some(&settings.initial_policy))?;

    let state = match wait {
        Some(policy) => Some(poller::wait_for_convergence(provider, &group, policy, clock)?),
        None => None,
    };

    info!(group = %group.name, id = %group.id, "environment created");
    Ok(CreateReport {
        id: group.id,
        name: group.name,
        metadata,
        load_balancer: lb,
        dns,
        policies,
        personality: summaries,
        state,
        created_at: Utc::now(),
    })
}

/// What teardown did to one kind of resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Removal {
    Deleted { ids: Vec<ResourceId> },
    NotFound,
}

impl Removal {
    fn from_ids(ids: Vec<ResourceId>) -> Self {
        if ids.is_empty() {
            Removal::NotFound
        } else {
            Removal::Deleted { ids }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Removal::NotFound)
    }
}

/// Result of `destroy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    pub scaling_groups: Removal,
    pub load_balancers: Removal,
    /// `None` when no domain is configured
    pub dns_records: Option<Removal>,
}

impl TeardownReport {
    /// True if nothing matched at all.
    pub fn is_empty(&self) -> bool {
        self.scaling_groups.is_not_found()
            && self.load_balancers.is_not_found()
            && self.dns_records.as_ref().map_or(true, Removal::is_not_found)
    }
}

/// Remove an environment's scaling groups, load balancers and DNS records.
///
/// Groups are drained to zero before deletion. Every resource with a
/// matching name goes, including duplicates.
pub fn teardown(
    provider: &dyn CloudProvider,
    names: &EnvironmentNames,
    domain: Option<&str>,
) -> Result<TeardownReport> {
    let mut groups = Vec::new();
    for group in provider.list_scaling_groups()? {
        if group.name != names.group {
            continue;
        }
        info!(name = %group.name, id = %group.id, "deleting scaling group");
        provider.set_group_bounds(&group.id, 0, 0)?;
        provider.delete_scaling_group(&group.id)?;
        groups.push(group.id);
    }
    if groups.is_empty() {
        warn!(name = %names.group, "no scaling group found");
    }

    let mut lbs = Vec::new();
    for lb in provider.list_load_balancers()? {
        if lb.name != names.load_balancer {
            continue;
        }
        info!(name = %lb.name, id = %lb.id, "deleting load balancer");
        provider.delete_load_balancer(&lb.id)?;
        lbs.push(lb.id);
    }
    if lbs.is_empty() {
        warn!(name = %names.load_balancer, "no load balancer found");
    }

    let dns_records = match domain {
        Some(domain) => {
            let removed = dns::remove_records(provider, domain, names)?;
            if removed.is_none() {
                warn!(domain, "dns domain not found");
            }
            Some(Removal::from_ids(removed.unwrap_or_default()))
        }
        None => None,
    };

    Ok(TeardownReport {
        scaling_groups: Removal::from_ids(groups),
        load_balancers: Removal::from_ids(lbs),
        dns_records,
    })
}

/// Result of `scale`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScaleOutcome {
    Executed {
        group_id: ResourceId,
        policy_id: ResourceId,
        policy_name: String,
    },
    GroupNotFound {
        group: String,
    },
    PolicyNotFound {
        group_id: ResourceId,
        policy_name: String,
        available: Vec<String>,
    },
}

impl ScaleOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, ScaleOutcome::Executed { .. })
    }
}

/// Execute the named policy on the environment's scaling group.
pub fn scale(
    provider: &dyn CloudProvider,
    names: &EnvironmentNames,
    policy_name: &str,
) -> Result<ScaleOutcome> {
    let Some(group) = find_group(provider, &names.group)? else {
        warn!(group = %names.group, "scaling group not found");
        return Ok(ScaleOutcome::GroupNotFound {
            group: names.group.clone(),
        });
    };

    let mut policies = provider.list_policies(&group.id)?;
    let Some(index) = policies.iter().position(|p| p.name == policy_name) else {
        warn!(group = %group.name, policy = policy_name, "policy not found");
        return Ok(ScaleOutcome::PolicyNotFound {
            group_id: group.id,
            policy_name: policy_name.to_string(),
            available: policies.into_iter().map(|p| p.name).collect(),
        });
    };

    let policy = policies.swap_remove(index);
    info!(group = %group.name, policy = %policy.name, "executing policy");
    provider.execute_policy(&group.id, &policy.id)?;
    Ok(ScaleOutcome::Executed {
        group_id: group.id,
        policy_id: policy.id,
        policy_name: policy.name,
    })
}

/// A server belonging to an environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRecord {
    pub name: String,
    pub id: ResourceId,
    pub ip: Option<String>,
    pub metadata: Metadata,
}

/// Servers whose metadata matches the environment and role.
pub fn list_nodes(
    provider: &dyn CloudProvider,
    names: &EnvironmentNames,
    role: &str,
) -> Result<Vec<NodeRecord>> {
    let has = |md: &Metadata, key: &str, want: &str| md.get(key).map(String::as_str) == Some(want);

    let nodes: Vec<NodeRecord> = provider
        .list_servers()?
        .into_iter()
        .filter(|s| {
            has(&s.metadata, "app", &names.app)
                && has(&s.metadata, "environment", &names.environment)
                && has(&s.metadata, "role", role)
        })
        .map(|s| NodeRecord {
            name: s.name,
            id: s.id,
            ip: s.access_ipv4,
            metadata: s.metadata,
        })
        .collect();

    debug!(count = nodes.len(), role, "matched nodes");
    Ok(nodes)
}
