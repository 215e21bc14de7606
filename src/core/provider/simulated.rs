//! In-memory cloud.
//!
//! Behaves like the real provider closely enough to drive the whole
//! lifecycle: load balancers get public virtual IPs, policies change the
//! desired capacity, groups converge immediately and their servers show up
//! in the server list. Used by the test suite and by `--dry-run`.
//!
//! Group states can be scripted to exercise the convergence wait, and any
//! operation can be made to fail to exercise partial failures.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

use tracing::debug;

use super::CloudProvider;
use crate::core::domain::{
    DnsDomain, DnsRecord, GroupState, Image, IpKind, IpVersion, LoadBalancer,
    LoadBalancerRequest, NewRecord, Policy, ScalingGroup, ScalingGroupRequest, Server, VirtualIp,
    Webhook,
};
use crate::core::policy::{Adjustment, ScalingPolicy};
use crate::core::types::{Metadata, ResourceId};
use crate::error::{ProviderError, Result};

#[derive(Debug)]
struct SimPolicy {
    id: ResourceId,
    name: String,
    adjustment: Adjustment,
    webhooks: Vec<Webhook>,
}

#[derive(Debug)]
struct SimGroup {
    id: ResourceId,
    name: String,
    min: u32,
    max: u32,
    desired: u32,
    server_name: String,
    metadata: Metadata,
    policies: Vec<SimPolicy>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    images: Vec<Image>,
    load_balancers: Vec<LoadBalancer>,
    groups: Vec<SimGroup>,
    domains: Vec<DnsDomain>,
    records: BTreeMap<ResourceId, Vec<DnsRecord>>,
    servers: Vec<Server>,
    scripted: VecDeque<GroupState>,
    fail_on: Option<String>,
    calls: Vec<String>,
}

impl State {
    fn id(&mut self, prefix: &str) -> ResourceId {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn group_mut(&mut self, group_id: &str) -> Result<&mut SimGroup> {
        self.groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| ProviderError::NotFound(format!("scaling group {}", group_id)).into())
    }
}

/// In-memory [`CloudProvider`].
#[derive(Debug, Default)]
pub struct SimulatedCloud {
    state: RefCell<State>,
}

impl SimulatedCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image.
    pub fn with_image(self, name: &str) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let id = state.id("img");
            state.images.push(Image {
                id,
                name: name.to_string(),
            });
        }
        self
    }

    /// Register a DNS domain.
    pub fn with_domain(self, name: &str) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let id = state.id("dom");
            state.records.insert(id.clone(), Vec::new());
            state.domains.push(DnsDomain {
                id,
                name: name.to_string(),
            });
        }
        self
    }

    /// Register a standalone server (not owned by any group).
    pub fn with_server(self, server: Server) -> Self {
        self.state.borrow_mut().servers.push(server);
        self
    }

    /// Queue group states returned by `group_state` before falling back to
    /// the computed state.
    pub fn with_group_states(self, states: impl IntoIterator<Item = GroupState>) -> Self {
        self.state.borrow_mut().scripted.extend(states);
        self
    }

    /// Make the named operation fail from now on.
    pub fn fail_on(&self, operation: &str) {
        self.state.borrow_mut().fail_on = Some(operation.to_string());
    }

    /// Operations called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    /// Record the call and apply failure injection.
    fn enter(&self, operation: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(operation.to_string());
        if state.fail_on.as_deref() == Some(operation) {
            debug!(operation, "simulated failure");
            return Err(ProviderError::Simulated(operation.to_string()).into());
        }
        Ok(())
    }

    fn group_servers(group: &SimGroup) -> impl Iterator<Item = Server> + '_ {
        (1..=group.desired).map(move |n| Server {
            id: format!("{}-srv-{}", group.id, n),
            name: format!("{}-{}", group.server_name, n),
            access_ipv4: Some(format!("198.51.100.{}", n)),
            metadata: group.metadata.clone(),
        })
    }
}

impl CloudProvider for SimulatedCloud {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn list_images(&self) -> Result<Vec<Image>> {
        self.enter("list_images")?;
        Ok(self.state.borrow().images.clone())
    }

    fn create_load_balancer(&self, request: &LoadBalancerRequest) -> Result<LoadBalancer> {
        self.enter("create_load_balancer")?;
        let mut state = self.state.borrow_mut();
        let id = state.id("lb");
        let n = state.next_id;
        let lb = LoadBalancer {
            id,
            name: request.name.clone(),
            port: request.port,
            virtual_ips: vec![
                VirtualIp {
                    address: format!("203.0.113.{}", n % 250 + 1),
                    kind: IpKind::Public,
                    ip_version: IpVersion::Ipv4,
                },
                VirtualIp {
                    address: format!("2001:db8::{:x}", n),
                    kind: IpKind::Public,
                    ip_version: IpVersion::Ipv6,
                },
            ],
        };
        state.load_balancers.push(lb.clone());
        Ok(lb)
    }

    fn list_load_balancers(&self) -> Result<Vec<LoadBalancer>> {
        self.enter("list_load_balancers")?;
        Ok(self.state.borrow().load_balancers.clone())
    }

    fn delete_load_balancer(&self, id: &str) -> Result<()> {
        self.enter("delete_load_balancer")?;
        let mut state = self.state.borrow_mut();
        let before = state.load_balancers.len();
        state.load_balancers.retain(|lb| lb.id != id);
        if state.load_balancers.len() == before {
            return Err(ProviderError::NotFound(format!("load balancer {}", id)).into());
        }
        Ok(())
    }

    fn create_scaling_group(&self, request: &ScalingGroupRequest) -> Result<ScalingGroup> {
        self.enter("create_scaling_group")?;
        let mut state = self.state.borrow_mut();
        if !state.images.iter().any(|i| i.id == request.image_id) {
            return Err(ProviderError::NotFound(format!("image {}", request.image_id)).into());
        }
        if !state
            .load_balancers
            .iter()
            .any(|lb| lb.id == request.load_balancer_id)
        {
            return Err(
                ProviderError::NotFound(format!("load balancer {}", request.load_balancer_id))
                    .into(),
            );
        }
        let id = state.id("asg");
        state.groups.push(SimGroup {
            id: id.clone(),
            name: request.name.clone(),
            min: request.min_entities,
            max: request.max_entities,
            desired: request.min_entities,
            server_name: request.server_name.clone(),
            metadata: request.metadata.clone(),
            policies: Vec::new(),
        });
        Ok(ScalingGroup {
            id,
            name: request.name.clone(),
        })
    }

    fn list_scaling_groups(&self) -> Result<Vec<ScalingGroup>> {
        self.enter("list_scaling_groups")?;
        Ok(self
            .state
            .borrow()
            .groups
            .iter()
            .map(|g| ScalingGroup {
                id: g.id.clone(),
                name: g.name.clone(),
            })
            .collect())
    }

    fn group_state(&self, group_id: &str) -> Result<GroupState> {
        self.enter("group_state")?;
        let mut state = self.state.borrow_mut();
        let desired = state.group_mut(group_id)?.desired;
        if let Some(scripted) = state.scripted.pop_front() {
            return Ok(scripted);
        }
        Ok(GroupState::new(desired, 0))
    }

    fn set_group_bounds(&self, group_id: &str, min: u32, max: u32) -> Result<()> {
        self.enter("set_group_bounds")?;
        let mut state = self.state.borrow_mut();
        let group = state.group_mut(group_id)?;
        group.min = min;
        group.max = max;
        group.desired = group.desired.clamp(min, max);
        Ok(())
    }

    fn delete_scaling_group(&self, group_id: &str) -> Result<()> {
        self.enter("delete_scaling_group")?;
        let mut state = self.state.borrow_mut();
        let group = state.group_mut(group_id)?;
        if group.desired > 0 {
            return Err(ProviderError::Http {
                method: "DELETE".to_string(),
                url: format!("/groups/{}", group_id),
                status: 403,
                message: "group still has active entities".to_string(),
            }
            .into());
        }
        state.groups.retain(|g| g.id != group_id);
        Ok(())
    }

    fn add_policy(&self, group_id: &str, policy: &ScalingPolicy) -> Result<Policy> {
        self.enter("add_policy")?;
        let mut state = self.state.borrow_mut();
        let id = state.id("pol");
        let group = state.group_mut(group_id)?;
        group.policies.push(SimPolicy {
            id: id.clone(),
            name: policy.name.to_string(),
            adjustment: policy.adjustment,
            webhooks: Vec::new(),
        });
        Ok(Policy {
            id,
            name: policy.name.to_string(),
        })
    }

    fn list_policies(&self, group_id: &str) -> Result<Vec<Policy>> {
        self.enter("list_policies")?;
        let mut state = self.state.borrow_mut();
        let group = state.group_mut(group_id)?;
        Ok(group
            .policies
            .iter()
            .map(|p| Policy {
                id: p.id.clone(),
                name: p.name.clone(),
            })
            .collect())
    }

    fn add_webhook(&self, group_id: &str, policy_id: &str, name: &str) -> Result<Webhook> {
        self.enter("add_webhook")?;
        let mut state = self.state.borrow_mut();
        let id = state.id("hook");
        let group = state.group_mut(group_id)?;
        let policy = group
            .policies
            .iter_mut()
            .find(|p| p.id == policy_id)
            .ok_or_else(|| ProviderError::NotFound(format!("policy {}", policy_id)))?;
        let webhook = Webhook {
            capability_url: Some(format!("https://autoscale.invalid/execute/1/{}/", id)),
            id,
            name: name.to_string(),
        };
        policy.webhooks.push(webhook.clone());
        Ok(webhook)
    }

    fn execute_policy(&self, group_id: &str, policy_id: &str) -> Result<()> {
        self.enter("execute_policy")?;
        let mut state = self.state.borrow_mut();
        let group = state.group_mut(group_id)?;
        let adjustment = group
            .policies
            .iter()
            .find(|p| p.id == policy_id)
            .map(|p| p.adjustment)
            .ok_or_else(|| ProviderError::NotFound(format!("policy {}", policy_id)))?;
        group.desired = adjustment.apply(group.desired, group.min, group.max);
        debug!(group = %group.name, desired = group.desired, "simulated policy executed");
        Ok(())
    }

    fn list_domains(&self) -> Result<Vec<DnsDomain>> {
        self.enter("list_domains")?;
        Ok(self.state.borrow().domains.clone())
    }

    fn list_records(&self, domain_id: &str) -> Result<Vec<DnsRecord>> {
        self.enter("list_records")?;
        self.state
            .borrow()
            .records
            .get(domain_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("domain {}", domain_id)).into())
    }

    fn delete_record(&self, domain_id: &str, record_id: &str) -> Result<()> {
        self.enter("delete_record")?;
        let mut state = self.state.borrow_mut();
        let records = state
            .records
            .get_mut(domain_id)
            .ok_or_else(|| ProviderError::NotFound(format!("domain {}", domain_id)))?;
        records.retain(|r| r.id != record_id);
        Ok(())
    }

    fn add_records(&self, domain_id: &str, records: &[NewRecord]) -> Result<Vec<DnsRecord>> {
        self.enter("add_records")?;
        let mut state = self.state.borrow_mut();
        if !state.records.contains_key(domain_id) {
            return Err(ProviderError::NotFound(format!("domain {}", domain_id)).into());
        }
        let mut added = Vec::with_capacity(records.len());
        for r in records {
            let id = state.id("rec");
            added.push(DnsRecord {
                id,
                name: r.name.clone(),
                record_type: r.record_type.clone(),
                data: r.data.clone(),
                ttl: r.ttl,
            });
        }
        if let Some(existing) = state.records.get_mut(domain_id) {
            existing.extend(added.iter().cloned());
        }
        Ok(added)
    }

    fn list_servers(&self) -> Result<Vec<Server>> {
        self.enter("list_servers")?;
        let state = self.state.borrow();
        let mut servers = state.servers.clone();
        for group in &state.groups {
            servers.extend(Self::group_servers(group));
        }
        Ok(servers)
    }
}
