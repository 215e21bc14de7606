//! Creation requests handed to a cloud provider.

use serde::Serialize;

use crate::core::constants::{
    GROUP_COOLDOWN_SECS, GROUP_MAX_ENTITIES, GROUP_MIN_ENTITIES, HEALTH_STATUS_REGEX, LB_PORT,
    PUBLIC_NET_ID, SERVICE_NET_ID,
};
use crate::core::personality::PersonalityFile;
use crate::core::types::{Metadata, ResourceId};

/// HTTP health check run by the load balancer against each node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMonitor {
    #[serde(rename = "type")]
    pub kind: String,
    pub delay: u32,
    pub timeout: u32,
    pub attempts_before_deactivation: u32,
    pub path: String,
    pub status_regex: String,
    pub body_regex: String,
}

impl HealthMonitor {
    /// Check `/` for a 2xx/3xx response whose body contains `marker`.
    pub fn for_marker(marker: &str) -> Self {
        Self {
            kind: "HTTP".to_string(),
            delay: 10,
            timeout: 5,
            attempts_before_deactivation: 2,
            path: "/".to_string(),
            status_regex: HEALTH_STATUS_REGEX.to_string(),
            body_regex: format!(".*{}.*", marker),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerRequest {
    pub name: String,
    pub port: u16,
    pub protocol: String,
    pub algorithm: String,
    pub health_monitor: HealthMonitor,
}

impl LoadBalancerRequest {
    /// Round-robin HTTP balancer with a single public virtual IP.
    pub fn http(name: &str, health_monitor: HealthMonitor) -> Self {
        Self {
            name: name.to_string(),
            port: LB_PORT,
            protocol: "HTTP".to_string(),
            algorithm: "ROUND_ROBIN".to_string(),
            health_monitor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalingGroupRequest {
    pub name: String,
    pub cooldown: u32,
    pub min_entities: u32,
    pub max_entities: u32,
    pub server_name: String,
    pub image_id: ResourceId,
    pub flavor_id: String,
    pub disk_config: String,
    pub metadata: Metadata,
    pub personality: Vec<PersonalityFile>,
    pub networks: Vec<String>,
    pub load_balancer_id: ResourceId,
    pub load_balancer_port: u16,
}

impl ScalingGroupRequest {
    /// Group with the standard shape: public and service networks, attached
    /// to `load_balancer_id` on the listener port.
    pub fn standard(
        name: &str,
        server_name: &str,
        image_id: &str,
        flavor_id: &str,
        metadata: Metadata,
        personality: Vec<PersonalityFile>,
        load_balancer_id: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            cooldown: GROUP_COOLDOWN_SECS,
            min_entities: GROUP_MIN_ENTITIES,
            max_entities: GROUP_MAX_ENTITIES,
            server_name: server_name.to_string(),
            image_id: image_id.to_string(),
            flavor_id: flavor_id.to_string(),
            disk_config: "MANUAL".to_string(),
            metadata,
            personality,
            networks: vec![PUBLIC_NET_ID.to_string(), SERVICE_NET_ID.to_string()],
            load_balancer_id: load_balancer_id.to_string(),
            load_balancer_port: LB_PORT,
        }
    }
}

/// A DNS record to add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub data: String,
    pub ttl: u32,
}

impl NewRecord {
    pub fn a(name: &str, address: &str, ttl: u32) -> Self {
        Self {
            name: name.to_string(),
            record_type: "A".to_string(),
            data: address.to_string(),
            ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_monitor_wire_format() {
        let json = serde_json::to_value(HealthMonitor::for_marker("WINDOWS_AUTOMATION_DEMO")).unwrap();
        assert_eq!(json["type"], "HTTP");
        assert_eq!(json["attemptsBeforeDeactivation"], 2);
        assert_eq!(json["statusRegex"], "^[23][0-9][0-9]$");
        assert_eq!(json["bodyRegex"], ".*WINDOWS_AUTOMATION_DEMO.*");
    }

    #[test]
    fn test_standard_group_networks() {
        let req = ScalingGroupRequest::standard(
            "win-stg",
            "win-stg",
            "img",
            "general1-2",
            Metadata::new(),
            vec![],
            "42",
        );
        assert_eq!(req.networks, vec![PUBLIC_NET_ID, SERVICE_NET_ID]);
        assert_eq!(req.load_balancer_port, 80);
        assert_eq!((req.min_entities, req.max_entities), (0, 16));
    }
}
