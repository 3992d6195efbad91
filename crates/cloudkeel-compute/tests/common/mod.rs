use async_trait::async_trait;
use cloudkeel_cloud::{
    BalancerRecord, CloudError, ControlPlane, HostFilter, HostRecord, Job, JobRequest, JobScope,
    ListenerState, MemberState, Page, PollConfig, Protocol, Result, VolumeAttachment,
    VolumeRecord,
};
use cloudkeel_compute::{
    BALANCER_NOT_FOUND_MSG, Client, ClientConfig, PageLimits, VOLUME_NOT_FOUND_MSG,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const NETWORK: &str = "net-1";

/// Client with a 1ms poll interval bound to [`NETWORK`]
#[allow(dead_code)]
pub fn client(plane: &Arc<FakeControlPlane>) -> Client {
    client_with_limits(plane, PageLimits::default())
}

#[allow(dead_code)]
pub fn client_with_limits(plane: &Arc<FakeControlPlane>, limits: PageLimits) -> Client {
    let config = ClientConfig {
        poll: PollConfig {
            interval: Duration::from_millis(1),
            max_wait: None,
        },
        limits,
        network_id: Some(NETWORK.to_string()),
    };
    Client::new(plane.clone(), config)
}

#[allow(dead_code)]
pub fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// How a failing job of one operation behaves
#[derive(Debug, Clone)]
struct Failure {
    message: String,
    /// Whether the mutation still happens remotely
    apply: bool,
    /// Resource id reported by the failed job
    resource_id: Option<String>,
}

#[derive(Debug, Clone)]
struct FakeListener {
    balancer_id: String,
    id: String,
    name: String,
    frontend_port: u16,
    protocol: Protocol,
    pool_id: String,
}

#[derive(Default)]
struct State {
    hosts: Vec<HostRecord>,
    balancers: Vec<BalancerRecord>,
    listeners: Vec<FakeListener>,
    members: Vec<(String, MemberState)>,
    volumes: Vec<VolumeRecord>,

    calls: Vec<String>,
    submitted: Vec<JobRequest>,
    jobs: HashMap<String, Job>,
    next_id: u64,

    failures: HashMap<&'static str, Failure>,
    reject_submit: Option<CloudError>,
    query_error: Option<CloudError>,
    describe_balancer_error: Option<CloudError>,
    stall_jobs: bool,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn listener_state(&self, listener: &FakeListener) -> ListenerState {
        let backend_port = self
            .members
            .iter()
            .find(|(pool, _)| *pool == listener.pool_id)
            .map(|(_, m)| m.port);
        ListenerState {
            id: listener.id.clone(),
            name: listener.name.clone(),
            frontend_port: listener.frontend_port,
            protocol: listener.protocol,
            backend_port,
            pool_id: listener.pool_id.clone(),
        }
    }

    fn add_member(&mut self, pool_id: &str, host_id: &str, port: u16) -> String {
        let id = self.next_id("mem");
        self.members.push((
            pool_id.to_string(),
            MemberState {
                id: id.clone(),
                host_id: host_id.to_string(),
                port,
            },
        ));
        id
    }

    /// Apply a mutation; `Err` carries the failure message of the job
    fn apply(&mut self, request: &JobRequest) -> std::result::Result<Option<String>, String> {
        match request {
            JobRequest::CreateVolume(req) => {
                let id = self.next_id("vol");
                self.volumes.push(VolumeRecord {
                    id: id.clone(),
                    name: req.name.clone(),
                    size_gb: req.size_gb,
                    attachment: None,
                });
                Ok(Some(id))
            }
            JobRequest::DeleteVolume { volume_id } => {
                let before = self.volumes.len();
                self.volumes.retain(|v| v.id != *volume_id);
                if self.volumes.len() == before {
                    return Err(VOLUME_NOT_FOUND_MSG.to_string());
                }
                Ok(None)
            }
            JobRequest::AttachVolume { volume_id, host_id } => {
                let host_name = self
                    .hosts
                    .iter()
                    .find(|h| h.id == *host_id)
                    .map(|h| h.name.clone())
                    .ok_or_else(|| "host not found".to_string())?;
                let volume = self
                    .volumes
                    .iter_mut()
                    .find(|v| v.id == *volume_id)
                    .ok_or_else(|| VOLUME_NOT_FOUND_MSG.to_string())?;
                volume.attachment = Some(VolumeAttachment {
                    host_id: host_id.clone(),
                    host_name,
                    device: "/dev/vdb".to_string(),
                });
                Ok(None)
            }
            JobRequest::DetachVolume { volume_id } => {
                let volume = self
                    .volumes
                    .iter_mut()
                    .find(|v| v.id == *volume_id)
                    .ok_or_else(|| VOLUME_NOT_FOUND_MSG.to_string())?;
                volume.attachment = None;
                Ok(None)
            }
            JobRequest::ResizeVolume { volume_id, size_gb } => {
                let volume = self
                    .volumes
                    .iter_mut()
                    .find(|v| v.id == *volume_id)
                    .ok_or_else(|| VOLUME_NOT_FOUND_MSG.to_string())?;
                volume.size_gb = *size_gb;
                Ok(None)
            }
            JobRequest::CreateBalancer(req) => {
                let id = self.next_id("slb");
                self.balancers.push(BalancerRecord {
                    id: id.clone(),
                    name: req.name.clone(),
                    bandwidth_mbps: req.bandwidth_mbps,
                    external_address: Some(format!("203.0.113.{}", self.next_id)),
                });
                Ok(Some(id))
            }
            JobRequest::DeleteBalancer { balancer_id } => {
                let before = self.balancers.len();
                self.balancers.retain(|b| b.id != *balancer_id);
                if self.balancers.len() == before {
                    return Err(BALANCER_NOT_FOUND_MSG.to_string());
                }
                self.listeners.retain(|l| l.balancer_id != *balancer_id);
                Ok(None)
            }
            JobRequest::CreateListeners {
                balancer_id,
                listeners,
            } => {
                for input in listeners {
                    let id = self.next_id("lsn");
                    let pool_id = self.next_id("pool");
                    for member in &input.members {
                        self.add_member(&pool_id, &member.host_id, member.port);
                    }
                    self.listeners.push(FakeListener {
                        balancer_id: balancer_id.clone(),
                        id,
                        name: input.name.clone(),
                        frontend_port: input.frontend_port,
                        protocol: input.protocol,
                        pool_id,
                    });
                }
                Ok(None)
            }
            JobRequest::UpdateListeners { listeners } => {
                for update in listeners {
                    let listener = self
                        .listeners
                        .iter_mut()
                        .find(|l| l.id == update.listener_id)
                        .ok_or_else(|| "listener not found".to_string())?;
                    listener.name = update.name.clone();
                    listener.frontend_port = update.frontend_port;
                    listener.protocol = update.protocol;
                }
                Ok(None)
            }
            JobRequest::DeleteListeners { listener_ids } => {
                let pools: Vec<String> = self
                    .listeners
                    .iter()
                    .filter(|l| listener_ids.contains(&l.id))
                    .map(|l| l.pool_id.clone())
                    .collect();
                self.listeners.retain(|l| !listener_ids.contains(&l.id));
                self.members.retain(|(pool, _)| !pools.contains(pool));
                Ok(None)
            }
            JobRequest::AddMembers { pool_id, members } => {
                for member in members {
                    self.add_member(pool_id, &member.host_id, member.port);
                }
                Ok(None)
            }
            JobRequest::RemoveMembers { member_ids } => {
                self.members.retain(|(_, m)| !member_ids.contains(&m.id));
                Ok(None)
            }
        }
    }
}

/// In-memory control plane
///
/// Jobs are carried out at submit time and reported done on the first query.
#[derive(Default)]
pub struct FakeControlPlane {
    state: Mutex<State>,
}

#[allow(dead_code)]
impl FakeControlPlane {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_host(&self, id: &str, name: &str, network_id: &str) {
        self.state.lock().unwrap().hosts.push(HostRecord {
            id: id.to_string(),
            name: name.to_string(),
            network_id: Some(network_id.to_string()),
        });
    }

    pub fn add_balancer(&self, id: &str, external_address: Option<&str>) {
        self.state.lock().unwrap().balancers.push(BalancerRecord {
            id: id.to_string(),
            name: id.to_string(),
            bandwidth_mbps: 1,
            external_address: external_address.map(str::to_string),
        });
    }

    /// Add a listener without members and return its pool id
    pub fn add_listener(
        &self,
        balancer_id: &str,
        id: &str,
        name: &str,
        frontend_port: u16,
        protocol: Protocol,
    ) -> String {
        let pool_id = format!("pool-{}", id);
        self.state.lock().unwrap().listeners.push(FakeListener {
            balancer_id: balancer_id.to_string(),
            id: id.to_string(),
            name: name.to_string(),
            frontend_port,
            protocol,
            pool_id: pool_id.clone(),
        });
        pool_id
    }

    pub fn add_member(&self, pool_id: &str, host_id: &str, port: u16) -> String {
        self.state.lock().unwrap().add_member(pool_id, host_id, port)
    }

    pub fn add_volume(&self, id: &str, name: &str, size_gb: u32) {
        self.state.lock().unwrap().volumes.push(VolumeRecord {
            id: id.to_string(),
            name: name.to_string(),
            size_gb,
            attachment: None,
        });
    }

    /// Jobs of `operation` finish unsuccessfully with `message`; the mutation
    /// still happens when `apply` is set
    pub fn fail_operation(&self, operation: &'static str, message: &str, apply: bool) {
        self.state.lock().unwrap().failures.insert(
            operation,
            Failure {
                message: message.to_string(),
                apply,
                resource_id: None,
            },
        );
    }

    /// Jobs of `operation` fail without mutating anything but still report
    /// `resource_id`
    pub fn fail_operation_with_resource(
        &self,
        operation: &'static str,
        message: &str,
        resource_id: &str,
    ) {
        self.state.lock().unwrap().failures.insert(
            operation,
            Failure {
                message: message.to_string(),
                apply: false,
                resource_id: Some(resource_id.to_string()),
            },
        );
    }

    pub fn reject_submit(&self, error: CloudError) {
        self.state.lock().unwrap().reject_submit = Some(error);
    }

    pub fn fail_queries(&self, error: CloudError) {
        self.state.lock().unwrap().query_error = Some(error);
    }

    pub fn fail_describe_balancer(&self, error: CloudError) {
        self.state.lock().unwrap().describe_balancer_error = Some(error);
    }

    /// Jobs never leave the pending state
    pub fn stall_jobs(&self) {
        self.state.lock().unwrap().stall_jobs = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_log(&self) {
        let mut state = self.state.lock().unwrap();
        state.calls.clear();
        state.submitted.clear();
    }

    pub fn submitted(&self) -> Vec<JobRequest> {
        self.state.lock().unwrap().submitted.clone()
    }

    /// Operations submitted so far, in order
    pub fn operations(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .unwrap()
            .submitted
            .iter()
            .map(JobRequest::operation)
            .collect()
    }

    pub fn listeners(&self, balancer_id: &str) -> Vec<ListenerState> {
        let state = self.state.lock().unwrap();
        state
            .listeners
            .iter()
            .filter(|l| l.balancer_id == balancer_id)
            .map(|l| state.listener_state(l))
            .collect()
    }

    pub fn members(&self, pool_id: &str) -> Vec<MemberState> {
        self.state
            .lock()
            .unwrap()
            .members
            .iter()
            .filter(|(pool, _)| pool == pool_id)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn volume(&self, id: &str) -> Option<VolumeRecord> {
        self.state
            .lock()
            .unwrap()
            .volumes
            .iter()
            .find(|v| v.id == id)
            .cloned()
    }
}

fn paged<T: Clone>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.start as usize)
        .take(page.limit as usize)
        .collect()
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn submit(&self, request: JobRequest) -> Result<Job> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("submit:{}", request.operation()));
        if let Some(error) = state.reject_submit.take() {
            return Err(error);
        }
        state.submitted.push(request.clone());

        let failure = state.failures.get(request.operation()).cloned();
        let outcome = match &failure {
            Some(failure) if !failure.apply => Err(failure.message.clone()),
            _ => state.apply(&request),
        };

        let id = state.next_id("job");
        let job = match (outcome, failure) {
            (Ok(resource_id), None) => Job {
                id: id.clone(),
                done: true,
                succeeded: true,
                result_message: "success".to_string(),
                resource_id,
            },
            (Ok(resource_id), Some(failure)) => Job {
                id: id.clone(),
                done: true,
                succeeded: false,
                result_message: failure.message,
                resource_id: resource_id.or(failure.resource_id),
            },
            (Err(message), failure) => Job {
                id: id.clone(),
                done: true,
                succeeded: false,
                result_message: message,
                resource_id: failure.and_then(|f| f.resource_id),
            },
        };
        state.jobs.insert(id.clone(), job);
        Ok(Job::pending(id))
    }

    async fn query_job(&self, job_id: &str, _scope: &JobScope) -> Result<Job> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("query_job:{}", job_id));
        if let Some(error) = state.query_error.clone() {
            return Err(error);
        }
        if state.stall_jobs {
            return Ok(Job::pending(job_id));
        }
        state.jobs.get(job_id).cloned().ok_or(CloudError::Remote {
            code: 404,
            message: format!("no such job {}", job_id),
        })
    }

    async fn list_hosts(&self, filter: &HostFilter, page: Page) -> Result<Vec<HostRecord>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("list_hosts".to_string());
        let hosts = state
            .hosts
            .iter()
            // Name filtering is fuzzy on the server side
            .filter(|h| filter.name.as_ref().is_none_or(|n| h.name.contains(n.as_str())))
            .filter(|h| {
                filter.network_ids.is_empty()
                    || h
                        .network_id
                        .as_ref()
                        .is_some_and(|n| filter.network_ids.contains(n))
            })
            .cloned()
            .collect();
        Ok(paged(hosts, page))
    }

    async fn list_listeners(&self, balancer_id: &str, page: Page) -> Result<Vec<ListenerState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("list_listeners".to_string());
        let listeners = state
            .listeners
            .iter()
            .filter(|l| l.balancer_id == balancer_id)
            .map(|l| state.listener_state(l))
            .collect();
        Ok(paged(listeners, page))
    }

    async fn list_members(&self, pool_id: &str, page: Page) -> Result<Vec<MemberState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("list_members".to_string());
        let members = state
            .members
            .iter()
            .filter(|(pool, _)| pool == pool_id)
            .map(|(_, m)| m.clone())
            .collect();
        Ok(paged(members, page))
    }

    async fn describe_volume(&self, volume_id: &str) -> Result<Option<VolumeRecord>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("describe_volume".to_string());
        Ok(state.volumes.iter().find(|v| v.id == volume_id).cloned())
    }

    async fn describe_balancer(&self, balancer_id: &str) -> Result<Option<BalancerRecord>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("describe_balancer".to_string());
        if let Some(error) = state.describe_balancer_error.clone() {
            return Err(error);
        }
        Ok(state.balancers.iter().find(|b| b.id == balancer_id).cloned())
    }
}
