//! Load balancers
//!
//! Listener and member synchronisation for a balancer lives in
//! [`crate::sync`].

use crate::client::{Backend, created_resource, finished_job, require_id};
use cloudkeel_cloud::{
    AddressType, BalancerRecord, CallContext, CloudError, CreateBalancerRequest, JobRequest,
    JobScope, Result,
};

/// Job message the control plane reports for an unknown balancer
pub const BALANCER_NOT_FOUND_MSG: &str = "找不到指定SLB";

/// Error code the control plane answers with when reading an unknown balancer
pub const BALANCER_NOT_FOUND_CODE: i64 = 41070;

/// Options for creating a balancer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBalancer {
    pub scope: JobScope,
    pub name: String,
    pub bandwidth_mbps: u32,
}

/// Balancer operations, bound to the network members are resolved in
#[derive(Clone)]
pub struct BalancerClient {
    pub(crate) backend: Backend,
    pub(crate) network_id: Option<String>,
}

impl BalancerClient {
    pub(crate) fn new(backend: Backend, network_id: Option<String>) -> Self {
        Self {
            backend,
            network_id,
        }
    }

    pub fn network_id(&self) -> Option<&str> {
        self.network_id.as_deref()
    }

    /// Create an internet-facing balancer and return its id
    pub async fn create(&self, ctx: &CallContext, options: CreateBalancer) -> Result<String> {
        if options.name.is_empty() {
            return Err(CloudError::InvalidArgument(
                "empty balancer name".to_string(),
            ));
        }

        tracing::info!(
            "Creating balancer {} ({} Mbps)",
            options.name,
            options.bandwidth_mbps
        );
        let request = JobRequest::CreateBalancer(CreateBalancerRequest {
            scope: options.scope,
            name: options.name,
            network_id: self.network_id.clone(),
            address_type: AddressType::Internet,
            bandwidth_mbps: options.bandwidth_mbps,
        });
        let operation = request.operation();
        let job = self.backend.run_job(ctx, request).await?;
        created_resource(operation, job)
    }

    pub async fn delete(&self, ctx: &CallContext, balancer_id: &str) -> Result<()> {
        require_id("balancer", balancer_id)?;

        tracing::info!("Deleting balancer {}", balancer_id);
        let request = JobRequest::DeleteBalancer {
            balancer_id: balancer_id.to_string(),
        };
        let operation = request.operation();
        let job = self.backend.run_job(ctx, request).await?;
        finished_job(operation, job, BALANCER_NOT_FOUND_MSG, balancer_id)
    }

    pub async fn get(&self, ctx: &CallContext, balancer_id: &str) -> Result<BalancerRecord> {
        require_id("balancer", balancer_id)?;
        ctx.check()?;

        tracing::debug!("Describing balancer {}", balancer_id);
        self.backend
            .plane
            .describe_balancer(balancer_id)
            .await?
            .ok_or_else(|| CloudError::NotFound(balancer_id.to_string()))
    }

    /// Public address of a balancer
    pub async fn external_address(&self, ctx: &CallContext, balancer_id: &str) -> Result<String> {
        let balancer = self.get(ctx, balancer_id).await?;
        balancer
            .external_address
            .filter(|address| !address.is_empty())
            .ok_or_else(|| {
                CloudError::NotFound(format!("external address of balancer {}", balancer_id))
            })
    }

    /// Whether the balancer exists
    ///
    /// The not-found error code counts as an answer, not as a failure.
    pub async fn exists(&self, ctx: &CallContext, balancer_id: &str) -> Result<bool> {
        match self.get(ctx, balancer_id).await {
            Ok(_) => Ok(true),
            Err(CloudError::NotFound(_)) => Ok(false),
            Err(CloudError::Remote { code, .. }) if code == BALANCER_NOT_FOUND_CODE => Ok(false),
            Err(e) => Err(e),
        }
    }
}
