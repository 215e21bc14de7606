//! Resources returned by a cloud provider.

use serde::{Deserialize, Serialize};

use crate::core::types::{Metadata, ResourceId};

/// A bootable server image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub id: ResourceId,
    pub name: String,
}

/// Virtual IP network type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IpKind {
    Public,
    Servicenet,
}

/// Virtual IP address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IpVersion {
    Ipv4,
    Ipv6,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualIp {
    pub address: String,
    pub kind: IpKind,
    pub ip_version: IpVersion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadBalancer {
    pub id: ResourceId,
    pub name: String,
    pub port: u16,
    pub virtual_ips: Vec<VirtualIp>,
}

impl LoadBalancer {
    /// Public IPv4 addresses, the ones DNS records point at.
    pub fn public_ipv4(&self) -> impl Iterator<Item = &str> {
        self.virtual_ips
            .iter()
            .filter(|vip| vip.kind == IpKind::Public && vip.ip_version == IpVersion::Ipv4)
            .map(|vip| vip.address.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScalingGroup {
    pub id: ResourceId,
    pub name: String,
}

/// Capacity snapshot of a scaling group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupState {
    pub active_capacity: u32,
    pub pending_capacity: u32,
    pub desired_capacity: u32,
    pub paused: bool,
}

impl GroupState {
    /// Shorthand for scripted states in tests and the simulated cloud.
    pub fn new(active: u32, pending: u32) -> Self {
        Self {
            active_capacity: active,
            pending_capacity: pending,
            desired_capacity: active + pending,
            paused: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Policy {
    pub id: ResourceId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Webhook {
    pub id: ResourceId,
    pub name: String,
    /// Anonymous execution URL, when the provider returns one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsDomain {
    pub id: ResourceId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsRecord {
    pub id: ResourceId,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub data: String,
    pub ttl: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Server {
    pub id: ResourceId,
    pub name: String,
    pub access_ipv4: Option<String>,
    pub metadata: Metadata,
}
