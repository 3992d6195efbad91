//! Control plane trait definition
//!
//! The remote infrastructure API is injected behind [`ControlPlane`]. Every
//! mutation is expressed as a [`JobRequest`] and answered with a [`Job`]
//! handle; reads come back as plain records.

use crate::error::Result;
use crate::job::Job;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Remote control plane abstraction
///
/// Implementations wrap a transport/SDK. They map transport failures to
/// [`CloudError::Transport`](crate::CloudError::Transport) and application
/// error codes to [`CloudError::Remote`](crate::CloudError::Remote).
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Submit a mutation and return the handle of the job carrying it out
    async fn submit(&self, request: JobRequest) -> Result<Job>;

    /// Fetch the current state of a job
    async fn query_job(&self, job_id: &str, scope: &JobScope) -> Result<Job>;

    /// List compute hosts matching the filter
    async fn list_hosts(&self, filter: &HostFilter, page: Page) -> Result<Vec<HostRecord>>;

    /// List the listeners of a balancer
    async fn list_listeners(&self, balancer_id: &str, page: Page) -> Result<Vec<ListenerState>>;

    /// List the members of a backend pool
    async fn list_members(&self, pool_id: &str, page: Page) -> Result<Vec<MemberState>>;

    /// Read a volume, `None` when it does not exist
    async fn describe_volume(&self, volume_id: &str) -> Result<Option<VolumeRecord>>;

    /// Read a balancer, `None` when it does not exist
    async fn describe_balancer(&self, balancer_id: &str) -> Result<Option<BalancerRecord>>;
}

/// Region/zone hints attached to a request and used again when polling
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobScope {
    pub region_id: Option<String>,
    pub zone_id: Option<String>,
}

impl JobScope {
    pub fn new(region_id: impl Into<String>, zone_id: impl Into<String>) -> Self {
        Self {
            region_id: Some(region_id.into()),
            zone_id: Some(zone_id.into()),
        }
    }
}

/// Pagination window for list calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub start: u32,
    pub limit: u32,
}

impl Page {
    pub fn first(limit: u32) -> Self {
        Self { start: 0, limit }
    }

    pub fn next(self) -> Self {
        Self {
            start: self.start.saturating_add(self.limit),
            limit: self.limit,
        }
    }
}

/// Server-side filter for host listings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostFilter {
    /// Exact host name
    pub name: Option<String>,

    /// Restrict to hosts in these networks
    pub network_ids: Vec<String>,
}

impl HostFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            network_ids: Vec::new(),
        }
    }

    pub fn in_network(network_id: Option<&str>) -> Self {
        Self {
            name: None,
            network_ids: network_id.map(|n| vec![n.to_string()]).unwrap_or_default(),
        }
    }
}

/// Listener protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
    Http,
    Https,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "TCP"),
            Protocol::Udp => write!(f, "UDP"),
            Protocol::Http => write!(f, "HTTP"),
            Protocol::Https => write!(f, "HTTPS"),
        }
    }
}

/// Balancer address type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    Internet,
    Intranet,
}

// ============ Records ============

/// Compute host as returned by host listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub id: String,
    pub name: String,
    pub network_id: Option<String>,
}

/// Listener as it exists on a balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerState {
    pub id: String,
    pub name: String,
    pub frontend_port: u16,
    pub protocol: Protocol,

    /// Port carried by every bound member, `None` if the listener never had any
    pub backend_port: Option<u16>,

    /// Backend member pool bound to this listener
    pub pool_id: String,
}

/// Member of a backend pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberState {
    pub id: String,
    pub host_id: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRecord {
    pub id: String,
    pub name: String,
    pub size_gb: u32,
    pub attachment: Option<VolumeAttachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeAttachment {
    pub host_id: String,
    pub host_name: String,
    pub device: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancerRecord {
    pub id: String,
    pub name: String,
    pub bandwidth_mbps: u32,
    pub external_address: Option<String>,
}

// ============ Requests ============

/// Health check applied to a listener's backend pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub protocol: Protocol,
    pub interval_secs: u32,
    pub timeout_secs: u32,
    pub unhealthy_threshold: u32,
    pub healthy_threshold: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInput {
    pub host_id: String,
    pub port: u16,
    pub weight: u32,
}

/// Listener to be created, members included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerInput {
    pub name: String,
    pub protocol: Protocol,
    pub backend_protocol: Protocol,
    pub frontend_port: u16,
    pub algorithm: String,
    pub health_check: HealthCheck,
    pub members: Vec<MemberInput>,
}

/// In-place update of an existing listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerUpdate {
    pub listener_id: String,
    pub name: String,
    pub protocol: Protocol,
    pub backend_protocol: Protocol,
    pub frontend_port: u16,
    pub algorithm: String,
    pub health_check: HealthCheck,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateVolumeRequest {
    pub scope: JobScope,
    pub name: String,
    pub disk_type: String,
    pub size_gb: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBalancerRequest {
    pub scope: JobScope,
    pub name: String,
    pub network_id: Option<String>,
    pub address_type: AddressType,
    pub bandwidth_mbps: u32,
}

/// Every mutation the control plane accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobRequest {
    CreateVolume(CreateVolumeRequest),
    DeleteVolume {
        volume_id: String,
    },
    AttachVolume {
        volume_id: String,
        host_id: String,
    },
    DetachVolume {
        volume_id: String,
    },
    ResizeVolume {
        volume_id: String,
        size_gb: u32,
    },
    CreateBalancer(CreateBalancerRequest),
    DeleteBalancer {
        balancer_id: String,
    },
    CreateListeners {
        balancer_id: String,
        listeners: Vec<ListenerInput>,
    },
    UpdateListeners {
        listeners: Vec<ListenerUpdate>,
    },
    DeleteListeners {
        listener_ids: Vec<String>,
    },
    AddMembers {
        pool_id: String,
        members: Vec<MemberInput>,
    },
    RemoveMembers {
        member_ids: Vec<String>,
    },
}

impl JobRequest {
    /// Short label used in logs and error messages
    pub fn operation(&self) -> &'static str {
        match self {
            JobRequest::CreateVolume(_) => "create volume",
            JobRequest::DeleteVolume { .. } => "delete volume",
            JobRequest::AttachVolume { .. } => "attach volume",
            JobRequest::DetachVolume { .. } => "detach volume",
            JobRequest::ResizeVolume { .. } => "resize volume",
            JobRequest::CreateBalancer(_) => "create balancer",
            JobRequest::DeleteBalancer { .. } => "delete balancer",
            JobRequest::CreateListeners { .. } => "create listeners",
            JobRequest::UpdateListeners { .. } => "update listeners",
            JobRequest::DeleteListeners { .. } => "delete listeners",
            JobRequest::AddMembers { .. } => "add pool members",
            JobRequest::RemoveMembers { .. } => "remove pool members",
        }
    }

    /// Scope the resulting job should be polled with
    pub fn scope(&self) -> JobScope {
        match self {
            JobRequest::CreateVolume(req) => req.scope.clone(),
            JobRequest::CreateBalancer(req) => req.scope.clone(),
            _ => JobScope::default(),
        }
    }
}
