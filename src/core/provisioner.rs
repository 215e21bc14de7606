//! Resource provisioning.
//!
//! Creates the pieces of an environment in a fixed order: load balancer,
//! scaling group, scaling policies (each with a webhook), then optionally
//! executes the initial policy. Each step assumes the previous one worked.
//! Nothing is rolled back: on error, resources created so far stay behind
//! and `destroy` is the way to clean them up.

use serde::Serialize;
use tracing::{debug, info};

use crate::core::constants::{APP_MARKER, DEFAULT_ROLE};
use crate::core::domain::{
    HealthMonitor, Image, LoadBalancer, LoadBalancerRequest, ScalingGroup, ScalingGroupRequest,
};
use crate::core::naming::EnvironmentNames;
use crate::core::personality::PersonalityFile;
use crate::core::policy::CATALOG;
use crate::core::provider::CloudProvider;
use crate::core::types::Metadata;
use crate::error::Result;

/// Server metadata used to find an environment's nodes later.
pub fn environment_metadata(names: &EnvironmentNames, bootstrap_type: &str) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("environment".to_string(), names.environment.clone());
    metadata.insert("role".to_string(), DEFAULT_ROLE.to_string());
    metadata.insert("app".to_string(), names.app.clone());
    metadata.insert("bootstrap_type".to_string(), bootstrap_type.to_string());
    metadata
}

/// Step 1: the load balancer, with its health monitor.
pub fn create_load_balancer(
    provider: &dyn CloudProvider,
    names: &EnvironmentNames,
) -> Result<LoadBalancer> {
    let request = LoadBalancerRequest::http(&names.load_balancer, HealthMonitor::for_marker(APP_MARKER));
    let lb = provider.create_load_balancer(&request)?;
    info!(name = %lb.name, id = %lb.id, "created load balancer");
    Ok(lb)
}

/// Step 2: the scaling group behind `lb`.
pub fn create_group(
    provider: &dyn CloudProvider,
    names: &EnvironmentNames,
    image: &Image,
    flavor_id: &str,
    metadata: Metadata,
    personality: Vec<PersonalityFile>,
    lb: &LoadBalancer,
) -> Result<ScalingGroup> {
    let request = ScalingGroupRequest::standard(
        &names.group,
        &names.node_base,
        &image.id,
        flavor_id,
        metadata,
        personality,
        &lb.id,
    );
    let group = provider.create_scaling_group(&request)?;
    info!(name = %group.name, id = %group.id, "created scaling group");
    Ok(group)
}

/// A catalog policy as created on the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedPolicy {
    pub name: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

/// Policies created on a group, and which one (if any) was executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicySet {
    pub policies: Vec<ProvisionedPolicy>,
    pub executed: Option<String>,
}

/// Steps 3 and 4: the policy catalog with one webhook each, executing the
/// policy named `initial` right after its webhook is added.
///
/// An `initial` name that matches no catalog entry executes nothing.
pub fn attach_policies(
    provider: &dyn CloudProvider,
    group: &ScalingGroup,
    initial: Option<&str>,
) -> Result<PolicySet> {
    let mut set = PolicySet {
        policies: Vec::with_capacity(CATALOG.len()),
        executed: None,
    };

    for entry in CATALOG.iter() {
        let policy = provider.add_policy(&group.id, entry)?;
        let webhook = provider.add_webhook(&group.id, &policy.id, &entry.webhook_name())?;
        debug!(policy = %policy.name, id = %policy.id, "added policy");

        if initial == Some(entry.name) {
            info!(policy = %policy.name, id = %policy.id, "executing initial policy");
            provider.execute_policy(&group.id, &policy.id)?;
            set.executed = Some(policy.name.clone());
        }

        set.policies.push(ProvisionedPolicy {
            name: policy.name,
            id: policy.id,
            webhook_url: webhook.capability_url,
        });
    }

    Ok(set)
}
