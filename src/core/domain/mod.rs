//! Domain types.
//!
//! Cloud resources as the orchestration sees them, independent of any
//! provider's wire format.

mod request;
mod resource;

pub use request::{HealthMonitor, LoadBalancerRequest, NewRecord, ScalingGroupRequest};
pub use resource::{
    DnsDomain, DnsRecord, GroupState, Image, IpKind, IpVersion, LoadBalancer, Policy,
    ScalingGroup, Server, VirtualIp, Webhook,
};
