//! Cloud provider clients.
//!
//! The orchestration in `core::lifecycle` only talks to a [`CloudProvider`].
//! Clients are constructed explicitly and passed by reference; nothing holds
//! a global connection.
//!
//! ## Implementations
//!
//! - **rackspace**: REST client for the Rackspace Public Cloud APIs
//!   (identity, images, load balancers, autoscale, DNS, servers).
//! - **simulated**: in-memory cloud used by tests and `--dry-run`.

use crate::core::domain::{
    DnsDomain, DnsRecord, GroupState, Image, LoadBalancer, LoadBalancerRequest, NewRecord, Policy,
    ScalingGroup, ScalingGroupRequest, Server, Webhook,
};
use crate::core::policy::ScalingPolicy;
use crate::error::Result;

pub mod rackspace;
pub mod simulated;

pub use rackspace::RackspaceProvider;
pub use simulated::SimulatedCloud;

/// Operations the environment lifecycle needs from a cloud.
///
/// Every method is a single blocking API call (or a short fixed sequence of
/// them). Errors are returned as `ProviderError` and never retried.
pub trait CloudProvider {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    // Images

    fn list_images(&self) -> Result<Vec<Image>>;

    // Load balancers

    fn create_load_balancer(&self, request: &LoadBalancerRequest) -> Result<LoadBalancer>;
    fn list_load_balancers(&self) -> Result<Vec<LoadBalancer>>;
    fn delete_load_balancer(&self, id: &str) -> Result<()>;

    // Autoscale

    fn create_scaling_group(&self, request: &ScalingGroupRequest) -> Result<ScalingGroup>;
    fn list_scaling_groups(&self) -> Result<Vec<ScalingGroup>>;
    fn group_state(&self, group_id: &str) -> Result<GroupState>;
    /// Set the group's min/max entity bounds.
    fn set_group_bounds(&self, group_id: &str, min: u32, max: u32) -> Result<()>;
    fn delete_scaling_group(&self, group_id: &str) -> Result<()>;
    fn add_policy(&self, group_id: &str, policy: &ScalingPolicy) -> Result<Policy>;
    fn list_policies(&self, group_id: &str) -> Result<Vec<Policy>>;
    fn add_webhook(&self, group_id: &str, policy_id: &str, name: &str) -> Result<Webhook>;
    fn execute_policy(&self, group_id: &str, policy_id: &str) -> Result<()>;

    // DNS

    fn list_domains(&self) -> Result<Vec<DnsDomain>>;
    fn list_records(&self, domain_id: &str) -> Result<Vec<DnsRecord>>;
    fn delete_record(&self, domain_id: &str, record_id: &str) -> Result<()>;
    fn add_records(&self, domain_id: &str, records: &[NewRecord]) -> Result<Vec<DnsRecord>>;

    // Servers

    fn list_servers(&self) -> Result<Vec<Server>>;
}

/// Find an image by exact name.
pub fn find_image(provider: &dyn CloudProvider, name: &str) -> Result<Option<Image>> {
    Ok(provider.list_images()?.into_iter().find(|i| i.name == name))
}

/// First scaling group with exactly this name.
pub fn find_group(provider: &dyn CloudProvider, name: &str) -> Result<Option<ScalingGroup>> {
    Ok(provider
        .list_scaling_groups()?
        .into_iter()
        .find(|g| g.name == name))
}

/// First DNS domain with exactly this name. Duplicates are ambiguous; the
/// first one listed wins.
pub fn find_domain(provider: &dyn CloudProvider, name: &str) -> Result<Option<DnsDomain>> {
    Ok(provider.list_domains()?.into_iter().find(|d| d.name == name))
}
