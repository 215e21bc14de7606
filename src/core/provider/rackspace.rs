//! Rackspace Public Cloud client.
//!
//! Talks to the REST APIs directly with a blocking `reqwest` client:
//! identity v2 (API key auth and service catalog), Cloud Images,
//! Cloud Load Balancers, Auto Scale, Cloud DNS and Cloud Servers.
//!
//! Credentials come from the resolved configuration (`OS_USERNAME`,
//! `OS_API_KEY`, `OS_REGION`). Each call is made once; failures are returned
//! as `ProviderError` and never retried.

use std::time::Duration;

use base64::Engine;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, trace};

use super::CloudProvider;
use crate::core::config::Credentials;
use crate::core::domain::{
    DnsDomain, DnsRecord, GroupState, Image, IpKind, IpVersion, LoadBalancer,
    LoadBalancerRequest, NewRecord, Policy, ScalingGroup, ScalingGroupRequest, Server, VirtualIp,
    Webhook,
};
use crate::core::policy::{Adjustment, ScalingPolicy};
use crate::core::types::{Metadata, Secret};
use crate::error::{ProviderError, Result};

const PAGE_SIZE: usize = 100;
const DNS_JOB_POLL: Duration = Duration::from_secs(1);
const DNS_JOB_ATTEMPTS: u32 = 60;

/// Service types looked up in the identity service catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Service {
    Compute,
    Images,
    LoadBalancers,
    Autoscale,
    Dns,
}

impl Service {
    fn catalog_type(self) -> &'static str {
        match self {
            Service::Compute => "compute",
            Service::Images => "image",
            Service::LoadBalancers => "rax:load-balancer",
            Service::Autoscale => "rax:autoscale",
            Service::Dns => "rax:dns",
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access: Access,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Access {
    token: Token,
    #[serde(default)]
    service_catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct Token {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEndpoint {
    #[serde(default)]
    region: Option<String>,
    #[serde(rename = "publicURL")]
    public_url: String,
}

/// Public URL for `service` in `region`. Global services (DNS) list an
/// endpoint without a region.
fn endpoint_for(catalog: &[CatalogEntry], service: Service, region: &str) -> Option<String> {
    let entry = catalog.iter().find(|e| e.kind == service.catalog_type())?;
    entry
        .endpoints
        .iter()
        .find(|ep| {
            ep.region
                .as_deref()
                .is_some_and(|r| r.eq_ignore_ascii_case(region))
        })
        .or_else(|| entry.endpoints.iter().find(|ep| ep.region.is_none()))
        .map(|ep| ep.public_url.trim_end_matches('/').to_string())
}

#[derive(Debug, Deserialize)]
struct ImagesPage {
    images: Vec<WireImage>,
}

#[derive(Debug, Deserialize)]
struct WireImage {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLoadBalancer {
    id: u64,
    name: String,
    port: u16,
    #[serde(default)]
    virtual_ips: Vec<WireVirtualIp>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireVirtualIp {
    address: String,
    #[serde(rename = "type")]
    kind: IpKind,
    ip_version: IpVersion,
}

impl From<WireLoadBalancer> for LoadBalancer {
    fn from(lb: WireLoadBalancer) -> Self {
        LoadBalancer {
            id: lb.id.to_string(),
            name: lb.name,
            port: lb.port,
            virtual_ips: lb
                .virtual_ips
                .into_iter()
                .map(|v| VirtualIp {
                    address: v.address,
                    kind: v.kind,
                    ip_version: v.ip_version,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadBalancerEnvelope {
    load_balancer: WireLoadBalancer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadBalancerList {
    load_balancers: Vec<WireLoadBalancer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireGroupState {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    active_capacity: u32,
    #[serde(default)]
    pending_capacity: u32,
    #[serde(default)]
    desired_capacity: u32,
    #[serde(default)]
    paused: bool,
}

impl From<WireGroupState> for GroupState {
    fn from(s: WireGroupState) -> Self {
        GroupState {
            active_capacity: s.active_capacity,
            pending_capacity: s.pending_capacity,
            desired_capacity: s.desired_capacity,
            paused: s.paused,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireGroup {
    id: String,
    state: WireGroupState,
}

#[derive(Debug, Deserialize)]
struct GroupList {
    groups: Vec<WireGroup>,
}

#[derive(Debug, Deserialize)]
struct GroupCreated {
    group: WireGroupId,
}

#[derive(Debug, Deserialize)]
struct WireGroupId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GroupStateEnvelope {
    group: WireGroupState,
}

#[derive(Debug, Deserialize)]
struct WireNamed {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct PolicyList {
    policies: Vec<WireNamed>,
}

#[derive(Debug, Deserialize)]
struct WebhookList {
    webhooks: Vec<WireWebhook>,
}

#[derive(Debug, Deserialize)]
struct WireWebhook {
    id: String,
    name: String,
    #[serde(default)]
    links: Vec<WireLink>,
}

#[derive(Debug, Deserialize)]
struct WireLink {
    href: String,
    rel: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DomainPage {
    domains: Vec<WireNamed>,
    #[serde(default)]
    total_entries: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordPage {
    records: Vec<WireRecord>,
    #[serde(default)]
    total_entries: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct WireRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    data: String,
    #[serde(default)]
    ttl: u32,
}

impl From<WireRecord> for DnsRecord {
    fn from(r: WireRecord) -> Self {
        DnsRecord {
            id: r.id,
            name: r.name,
            record_type: r.record_type,
            data: r.data,
            ttl: r.ttl,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DnsJob {
    status: String,
    #[serde(default)]
    callback_url: Option<String>,
    #[serde(default)]
    response: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ServerPage {
    servers: Vec<WireServer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireServer {
    id: String,
    name: String,
    #[serde(default, rename = "accessIPv4")]
    access_ipv4: Option<String>,
    #[serde(default)]
    metadata: Metadata,
}

/// Policy body for the autoscale API.
fn policy_body(policy: &ScalingPolicy, cooldown: u32) -> Value {
    let mut body = json!({
        "name": policy.name,
        "type": "webhook",
        "cooldown": cooldown,
    });
    match policy.adjustment {
        Adjustment::Change(n) => body["change"] = json!(n),
        Adjustment::ChangePercent(n) => body["changePercent"] = json!(n),
        Adjustment::DesiredCapacity(n) => body["desiredCapacity"] = json!(n),
    }
    body
}

/// Group creation body. Personality contents are base64-encoded here.
fn group_body(request: &ScalingGroupRequest) -> Value {
    let personality: Vec<Value> = request
        .personality
        .iter()
        .map(|p| {
            json!({
                "path": p.path,
                "contents": base64::engine::general_purpose::STANDARD.encode(p.contents.as_bytes()),
            })
        })
        .collect();
    let networks: Vec<Value> = request.networks.iter().map(|n| json!({ "uuid": n })).collect();
    // Cloud Load Balancer ids are numeric on the wire.
    let lb_id = request
        .load_balancer_id
        .parse::<u64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(request.load_balancer_id.clone()));

    json!({
        "groupConfiguration": {
            "name": request.name,
            "cooldown": request.cooldown,
            "minEntities": request.min_entities,
            "maxEntities": request.max_entities,
            "metadata": {},
        },
        "launchConfiguration": {
            "type": "launch_server",
            "args": {
                "server": {
                    "name": request.server_name,
                    "imageRef": request.image_id,
                    "flavorRef": request.flavor_id,
                    "OS-DCF:diskConfig": request.disk_config,
                    "metadata": request.metadata,
                    "personality": personality,
                    "networks": networks,
                },
                "loadBalancers": [
                    { "loadBalancerId": lb_id, "port": request.load_balancer_port }
                ],
            },
        },
        "scalingPolicies": [],
    })
}

/// Rackspace Public Cloud [`CloudProvider`].
pub struct RackspaceProvider {
    http: Client,
    token: Secret,
    region: String,
    catalog: Vec<CatalogEntry>,
}

impl std::fmt::Debug for RackspaceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RackspaceProvider")
            .field("region", &self.region)
            .field("services", &self.catalog.len())
            .finish()
    }
}

impl RackspaceProvider {
    /// Authenticate with an API key and load the service catalog.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Auth` if the identity service rejects the
    /// credentials, or a transport error if it cannot be reached.
    pub fn connect(credentials: &Credentials) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("stagehand/", env!("CARGO_PKG_VERSION")))
            .build()?;

        debug!(
            username = %credentials.username,
            region = %credentials.region,
            auth_url = %credentials.auth_url,
            "authenticating"
        );

        let body = json!({
            "auth": {
                "RAX-KSKEY:apiKeyCredentials": {
                    "username": credentials.username,
                    "apiKey": credentials.api_key.expose(),
                }
            }
        });
        let response = http
            .post(&credentials.auth_url)
            .header("Accept", "application/json")
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "unable to read identity response".to_string());
            return Err(ProviderError::Auth(format!("{}: {}", status.as_u16(), message)).into());
        }
        let auth: AuthResponse = response.json().map_err(|e| ProviderError::Decode {
            url: credentials.auth_url.clone(),
            message: e.to_string(),
        })?;

        debug!(services = auth.access.service_catalog.len(), "authenticated");

        Ok(Self {
            http,
            token: Secret::new(auth.access.token.id),
            region: credentials.region.to_uppercase(),
            catalog: auth.access.service_catalog,
        })
    }

    fn endpoint(&self, service: Service) -> Result<String> {
        endpoint_for(&self.catalog, service, &self.region).ok_or_else(|| {
            ProviderError::MissingEndpoint {
                service: service.catalog_type().to_string(),
                region: self.region.clone(),
            }
            .into()
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("X-Auth-Token", self.token.expose())
            .header("Accept", "application/json")
    }

    fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Response> {
        trace!(%method, url, "request");
        let mut builder = self.request(method.clone(), url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(ProviderError::Http {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                message,
            }
            .into());
        }
        Ok(response)
    }

    fn call<T: DeserializeOwned>(&self, method: Method, url: &str, body: Option<&Value>) -> Result<T> {
        let response = self.send(method, url, body)?;
        response.json().map_err(|e| {
            ProviderError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.call(Method::GET, url, None)
    }

    /// Fetch a marker-paged collection until a short page comes back.
    fn marker_paged<P, T>(
        &self,
        base: &str,
        items: impl Fn(P) -> Vec<T>,
        id: impl Fn(&T) -> String,
    ) -> Result<Vec<T>>
    where
        P: DeserializeOwned,
    {
        collect_marker_pages(base, |url| Ok(items(self.get(url)?)), id)
    }

    /// Wait for an asynchronous Cloud DNS job to finish.
    fn await_dns_job(&self, job: DnsJob) -> Result<Option<Value>> {
        let mut job = job;
        for _ in 0..DNS_JOB_ATTEMPTS {
            match job.status.as_str() {
                "COMPLETED" => return Ok(job.response),
                "ERROR" => {
                    let message = job
                        .error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "dns job failed".to_string());
                    return Err(ProviderError::Http {
                        method: "GET".to_string(),
                        url: job.callback_url.unwrap_or_default(),
                        status: 400,
                        message,
                    }
                    .into());
                }
                _ => {}
            }
            let Some(callback) = job.callback_url.clone() else {
                return Ok(job.response);
            };
            std::thread::sleep(DNS_JOB_POLL);
            job = self.get(&format!("{}?showDetails=true", callback))?;
        }
        Err(ProviderError::Transport("timed out waiting for dns job".to_string()).into())
    }
}

impl CloudProvider for RackspaceProvider {
    fn name(&self) -> &'static str {
        "rackspace"
    }

    fn list_images(&self) -> Result<Vec<Image>> {
        let base = format!("{}/images", self.endpoint(Service::Images)?);
        let images = self.marker_paged(&base, |p: ImagesPage| p.images, |i| i.id.clone())?;
        Ok(images
            .into_iter()
            .map(|i| Image {
                id: i.id,
                name: i.name.unwrap_or_default(),
            })
            .collect())
    }

    fn create_load_balancer(&self, request: &LoadBalancerRequest) -> Result<LoadBalancer> {
        let url = format!("{}/loadbalancers", self.endpoint(Service::LoadBalancers)?);
        let body = json!({
            "loadBalancer": {
                "name": request.name,
                "port": request.port,
                "protocol": request.protocol,
                "algorithm": request.algorithm,
                "virtualIps": [{ "type": "PUBLIC" }],
                "nodes": [],
                "healthMonitor": request.health_monitor,
            }
        });
        let created: LoadBalancerEnvelope = self.call(Method::POST, &url, Some(&body))?;
        Ok(created.load_balancer.into())
    }

    fn list_load_balancers(&self) -> Result<Vec<LoadBalancer>> {
        let base = format!("{}/loadbalancers", self.endpoint(Service::LoadBalancers)?);
        let list = self.marker_paged(
            &base,
            |p: LoadBalancerList| p.load_balancers,
            |lb| lb.id.to_string(),
        )?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    fn delete_load_balancer(&self, id: &str) -> Result<()> {
        let url = format!("{}/loadbalancers/{}", self.endpoint(Service::LoadBalancers)?, id);
        self.send(Method::DELETE, &url, None)?;
        Ok(())
    }

    fn create_scaling_group(&self, request: &ScalingGroupRequest) -> Result<ScalingGroup> {
        let url = format!("{}/groups", self.endpoint(Service::Autoscale)?);
        let created: GroupCreated = self.call(Method::POST, &url, Some(&group_body(request)))?;
        Ok(ScalingGroup {
            id: created.group.id,
            name: request.name.clone(),
        })
    }

    fn list_scaling_groups(&self) -> Result<Vec<ScalingGroup>> {
        let base = format!("{}/groups", self.endpoint(Service::Autoscale)?);
        let groups = self.marker_paged(&base, |p: GroupList| p.groups, |g| g.id.clone())?;
        Ok(groups
            .into_iter()
            .map(|g| ScalingGroup {
                id: g.id,
                name: g.state.name.unwrap_or_default(),
            })
            .collect())
    }

    fn group_state(&self, group_id: &str) -> Result<GroupState> {
        let url = format!("{}/groups/{}/state", self.endpoint(Service::Autoscale)?, group_id);
        let state: GroupStateEnvelope = self.get(&url)?;
        Ok(state.group.into())
    }

    fn set_group_bounds(&self, group_id: &str, min: u32, max: u32) -> Result<()> {
        // The config endpoint only accepts a full configuration.
        let url = format!("{}/groups/{}/config", self.endpoint(Service::Autoscale)?, group_id);
        let mut current: Value = self.get(&url)?;
        let mut config = current
            .get_mut("groupConfiguration")
            .map(Value::take)
            .ok_or_else(|| ProviderError::Decode {
                url: url.clone(),
                message: "missing groupConfiguration".to_string(),
            })?;
        config["minEntities"] = json!(min);
        config["maxEntities"] = json!(max);
        self.send(Method::PUT, &url, Some(&config))?;
        Ok(())
    }

    fn delete_scaling_group(&self, group_id: &str) -> Result<()> {
        let url = format!("{}/groups/{}", self.endpoint(Service::Autoscale)?, group_id);
        self.send(Method::DELETE, &url, None)?;
        Ok(())
    }

    fn add_policy(&self, group_id: &str, policy: &ScalingPolicy) -> Result<Policy> {
        use crate::core::constants::POLICY_COOLDOWN_SECS;

        let url = format!("{}/groups/{}/policies", self.endpoint(Service::Autoscale)?, group_id);
        let body = json!([policy_body(policy, POLICY_COOLDOWN_SECS)]);
        let created: PolicyList = self.call(Method::POST, &url, Some(&body))?;
        created
            .policies
            .into_iter()
            .next()
            .map(|p| Policy { id: p.id, name: p.name })
            .ok_or_else(|| {
                ProviderError::Decode {
                    url,
                    message: "no policy returned".to_string(),
                }
                .into()
            })
    }

    fn list_policies(&self, group_id: &str) -> Result<Vec<Policy>> {
        let base = format!("{}/groups/{}/policies", self.endpoint(Service::Autoscale)?, group_id);
        let list = self.marker_paged(&base, |p: PolicyList| p.policies, |p| p.id.clone())?;
        Ok(list
            .into_iter()
            .map(|p| Policy { id: p.id, name: p.name })
            .collect())
    }

    fn add_webhook(&self, group_id: &str, policy_id: &str, name: &str) -> Result<Webhook> {
        let url = format!(
            "{}/groups/{}/policies/{}/webhooks",
            self.endpoint(Service::Autoscale)?,
            group_id,
            policy_id
        );
        let body = json!([{ "name": name }]);
        let created: WebhookList = self.call(Method::POST, &url, Some(&body))?;
        let hook = created.webhooks.into_iter().next().ok_or_else(|| ProviderError::Decode {
            url: url.clone(),
            message: "no webhook returned".to_string(),
        })?;
        let capability_url = hook
            .links
            .iter()
            .find(|l| l.rel == "capability")
            .map(|l| l.href.clone());
        Ok(Webhook {
            id: hook.id,
            name: hook.name,
            capability_url,
        })
    }

    fn execute_policy(&self, group_id: &str, policy_id: &str) -> Result<()> {
        let url = format!(
            "{}/groups/{}/policies/{}/execute",
            self.endpoint(Service::Autoscale)?,
            group_id,
            policy_id
        );
        self.send(Method::POST, &url, None)?;
        Ok(())
    }

    fn list_domains(&self) -> Result<Vec<DnsDomain>> {
        let base = format!("{}/domains", self.endpoint(Service::Dns)?);
        let mut domains = Vec::new();
        loop {
            let url = format!("{}?limit={}&offset={}", base, PAGE_SIZE, domains.len());
            let page: DomainPage = self.get(&url)?;
            let fetched = page.domains.len();
            domains.extend(page.domains.into_iter().map(|d| DnsDomain { id: d.id, name: d.name }));
            let total = page.total_entries.unwrap_or(domains.len());
            if fetched == 0 || domains.len() >= total {
                return Ok(domains);
            }
        }
    }

    fn list_records(&self, domain_id: &str) -> Result<Vec<DnsRecord>> {
        let base = format!("{}/domains/{}/records", self.endpoint(Service::Dns)?, domain_id);
        let mut records = Vec::new();
        loop {
            let url = format!("{}?limit={}&offset={}", base, PAGE_SIZE, records.len());
            let page: RecordPage = self.get(&url)?;
            let fetched = page.records.len();
            records.extend(page.records.into_iter().map(DnsRecord::from));
            let total = page.total_entries.unwrap_or(records.len());
            if fetched == 0 || records.len() >= total {
                return Ok(records);
            }
        }
    }

    fn delete_record(&self, domain_id: &str, record_id: &str) -> Result<()> {
        let url = format!(
            "{}/domains/{}/records/{}",
            self.endpoint(Service::Dns)?,
            domain_id,
            record_id
        );
        let job: DnsJob = self.call(Method::DELETE, &url, None)?;
        self.await_dns_job(job)?;
        Ok(())
    }

    fn add_records(&self, domain_id: &str, records: &[NewRecord]) -> Result<Vec<DnsRecord>> {
        let url = format!("{}/domains/{}/records", self.endpoint(Service::Dns)?, domain_id);
        let body = json!({ "records": records });
        let job: DnsJob = self.call(Method::POST, &url, Some(&body))?;
        let Some(response) = self.await_dns_job(job)? else {
            return Ok(Vec::new());
        };
        let page: RecordPage = serde_json::from_value(response).map_err(|e| ProviderError::Decode {
            url,
            message: e.to_string(),
        })?;
        Ok(page.records.into_iter().map(DnsRecord::from).collect())
    }

    fn list_servers(&self) -> Result<Vec<Server>> {
        let base = format!("{}/servers/detail", self.endpoint(Service::Compute)?);
        let servers = self.marker_paged(&base, |p: ServerPage| p.servers, |s| s.id.clone())?;
        Ok(servers
            .into_iter()
            .map(|s| Server {
                id: s.id,
                name: s.name,
                access_ipv4: s.access_ipv4.filter(|ip| !ip.is_empty()),
                metadata: s.metadata,
            })
            .collect())
    }
}

/// Walk `limit`/`marker` pages starting at `base`. The marker is the id of
/// the last item of the previous page.
fn collect_marker_pages<T>(
    base: &str,
    mut fetch: impl FnMut(&str) -> Result<Vec<T>>,
    id: impl Fn(&T) -> String,
) -> Result<Vec<T>> {
    let sep = if base.contains('?') { '&' } else { '?' };
    let mut all = Vec::new();
    let mut marker: Option<String> = None;
    loop {
        let url = match &marker {
            Some(m) => format!("{}{}limit={}&marker={}", base, sep, PAGE_SIZE, m),
            None => format!("{}{}limit={}", base, sep, PAGE_SIZE),
        };
        let page = fetch(&url)?;
        let short = page.len() < PAGE_SIZE;
        marker = page.last().map(&id);
        all.extend(page);
        if short || marker.is_none() {
            return Ok(all);
        }
    }
}
