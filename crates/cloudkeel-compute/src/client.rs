//! Client entry point and the collaborators shared by every resource client

use crate::balancer::BalancerClient;
use crate::resolver::NameResolver;
use crate::volume::VolumeClient;
use cloudkeel_cloud::{
    CallContext, CloudError, ControlPlane, Job, JobRequest, JobWaiter, Page, PollConfig, Result,
};
use cloudkeel_config::Settings;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Page sizes for remote listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub hosts: u32,
    pub listeners: u32,
    pub members: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            hosts: 500,
            listeners: 100,
            members: 500,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub poll: PollConfig,
    pub limits: PageLimits,

    /// Network used by [`Client::balancers`]
    pub network_id: Option<String>,
}

impl From<&Settings> for ClientConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            poll: PollConfig {
                interval: Duration::from_millis(settings.poll.interval_ms),
                max_wait: settings.poll.max_wait_secs.map(Duration::from_secs),
            },
            limits: PageLimits {
                hosts: settings.limits.hosts,
                listeners: settings.limits.listeners,
                members: settings.limits.members,
            },
            network_id: settings.network_id.clone(),
        }
    }
}

/// Collaborators injected into every resource client
#[derive(Clone)]
pub(crate) struct Backend {
    pub(crate) plane: Arc<dyn ControlPlane>,
    pub(crate) waiter: JobWaiter,
    pub(crate) resolver: NameResolver,
    pub(crate) limits: PageLimits,
}

impl Backend {
    /// Submit a request and wait for its job to finish
    pub(crate) async fn run_job(&self, ctx: &CallContext, request: JobRequest) -> Result<Job> {
        ctx.check()?;

        let scope = request.scope();
        tracing::debug!("Submitting job: {}", request.operation());
        let job = self.plane.submit(request).await?;
        self.waiter.wait(ctx, job, &scope).await
    }

    /// Like [`Backend::run_job`], but an unsuccessful job is an error
    pub(crate) async fn run_batch(&self, ctx: &CallContext, request: JobRequest) -> Result<()> {
        let operation = request.operation();
        let job = self.run_job(ctx, request).await?;
        if !job.succeeded {
            return Err(CloudError::from_job(operation, &job));
        }
        Ok(())
    }
}

/// Resolve the id produced by a create job
///
/// A job can fail after the resource was already created; the id wins over
/// the failure in that case.
pub(crate) fn created_resource(operation: &str, job: Job) -> Result<String> {
    match job.resource_id.as_deref() {
        Some(id) if !id.is_empty() => {
            if !job.succeeded {
                tracing::warn!(
                    resource_id = %id,
                    "{} reported failure but created the resource: {}",
                    operation,
                    job.result_message
                );
            }
            Ok(id.to_string())
        }
        _ if job.succeeded => Err(CloudError::job_failed(
            operation,
            "job finished without a resource id",
        )),
        _ => Err(CloudError::from_job(operation, &job)),
    }
}

/// Turn an unsuccessful job into an error, mapping the remote "not found" text
pub(crate) fn finished_job(
    operation: &str,
    job: Job,
    not_found_message: &str,
    resource_id: &str,
) -> Result<()> {
    if job.succeeded {
        return Ok(());
    }
    if job.result_message == not_found_message {
        return Err(CloudError::NotFound(resource_id.to_string()));
    }
    Err(CloudError::from_job(operation, &job))
}

pub(crate) fn require_id(kind: &str, id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(CloudError::InvalidArgument(format!("empty {} id", kind)));
    }
    Ok(())
}

/// Fetch every page of a listing
///
/// Stops at the first page shorter than `limit`.
pub(crate) async fn collect_pages<T, F, Fut>(limit: u32, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Page) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut page = Page::first(limit);
    let mut items = Vec::new();
    loop {
        let batch = fetch(page).await?;
        let len = batch.len();
        items.extend(batch);
        if len == 0 || len < limit as usize {
            return Ok(items);
        }
        page = page.next();
    }
}

/// Entry point: hands out volume and balancer clients sharing one control plane
///
/// # Example
///
/// ```ignore
/// use cloudkeel_compute::{Client, ClientConfig, ListenerSpec};
/// use cloudkeel_cloud::{CallContext, Protocol};
///
/// let client = Client::new(plane, ClientConfig::default());
/// let ctx = CallContext::new();
///
/// let listeners = vec![ListenerSpec::new("http", 5090, 5092, Protocol::Tcp)];
/// client
///     .balancers_in("vpc-1")
///     .sync_listeners(&ctx, &balancer_id, &listeners, &["web-1".to_string()])
///     .await?;
/// ```
#[derive(Clone)]
pub struct Client {
    backend: Backend,
    network_id: Option<String>,
}

impl Client {
    pub fn new(plane: Arc<dyn ControlPlane>, config: ClientConfig) -> Self {
        let backend = Backend {
            waiter: JobWaiter::new(plane.clone(), config.poll),
            resolver: NameResolver::new(plane.clone(), config.limits.hosts),
            plane,
            limits: config.limits,
        };
        Self {
            backend,
            network_id: config.network_id,
        }
    }

    pub fn from_settings(plane: Arc<dyn ControlPlane>, settings: &Settings) -> Self {
        Self::new(plane, ClientConfig::from(settings))
    }

    pub fn volumes(&self) -> VolumeClient {
        VolumeClient::new(self.backend.clone())
    }

    /// Balancer client bound to the configured network
    pub fn balancers(&self) -> BalancerClient {
        BalancerClient::new(self.backend.clone(), self.network_id.clone())
    }

    /// Balancer client bound to an explicit network
    pub fn balancers_in(&self, network_id: impl Into<String>) -> BalancerClient {
        BalancerClient::new(self.backend.clone(), Some(network_id.into()))
    }

    pub fn resolver(&self) -> &NameResolver {
        &self.backend.resolver
    }
}
