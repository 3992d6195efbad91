//! Block storage volumes

use crate::client::{Backend, created_resource, finished_job, require_id};
use cloudkeel_cloud::{
    CallContext, CloudError, CreateVolumeRequest, JobRequest, Result, VolumeRecord,
};

/// Job message the control plane reports for an unknown volume
pub const VOLUME_NOT_FOUND_MSG: &str = "找不到指定EBS";

/// Volume operations
#[derive(Clone)]
pub struct VolumeClient {
    backend: Backend,
}

impl VolumeClient {
    pub(crate) fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Create a volume and return its id
    ///
    /// A job that fails after the volume came into existence still returns
    /// the id.
    pub async fn create(&self, ctx: &CallContext, request: CreateVolumeRequest) -> Result<String> {
        if request.name.is_empty() {
            return Err(CloudError::InvalidArgument("empty volume name".to_string()));
        }

        tracing::info!("Creating volume {} ({} GB)", request.name, request.size_gb);
        let request = JobRequest::CreateVolume(request);
        let operation = request.operation();
        let job = self.backend.run_job(ctx, request).await?;
        created_resource(operation, job)
    }

    pub async fn delete(&self, ctx: &CallContext, volume_id: &str) -> Result<()> {
        require_id("volume", volume_id)?;

        tracing::info!("Deleting volume {}", volume_id);
        let request = JobRequest::DeleteVolume {
            volume_id: volume_id.to_string(),
        };
        let operation = request.operation();
        let job = self.backend.run_job(ctx, request).await?;
        finished_job(operation, job, VOLUME_NOT_FOUND_MSG, volume_id)
    }

    /// Attach a volume to the host called `host_name` and return the device path
    ///
    /// The job outcome alone is not trusted: the volume is read back and only
    /// an attachment to that host counts as success.
    pub async fn attach(
        &self,
        ctx: &CallContext,
        volume_id: &str,
        host_name: &str,
    ) -> Result<String> {
        require_id("volume", volume_id)?;

        let host_id = self.backend.resolver.resolve_one(ctx, host_name).await?;

        tracing::info!("Attaching volume {} to {}", volume_id, host_name);
        let request = JobRequest::AttachVolume {
            volume_id: volume_id.to_string(),
            host_id: host_id.clone(),
        };
        let operation = request.operation();
        let job = self.backend.run_job(ctx, request).await?;

        let volume = self.get(ctx, volume_id).await?;
        match volume.attachment {
            Some(attachment) if attachment.host_id == host_id => {
                if !job.succeeded {
                    tracing::warn!(
                        "{} reported failure but volume {} is attached: {}",
                        operation,
                        volume_id,
                        job.result_message
                    );
                }
                Ok(attachment.device)
            }
            _ => Err(CloudError::from_job(operation, &job)),
        }
    }

    /// Detach a volume from whatever host holds it
    pub async fn detach(&self, ctx: &CallContext, volume_id: &str) -> Result<()> {
        require_id("volume", volume_id)?;

        tracing::info!("Detaching volume {}", volume_id);
        let request = JobRequest::DetachVolume {
            volume_id: volume_id.to_string(),
        };
        let operation = request.operation();
        let job = self.backend.run_job(ctx, request).await?;

        // A volume that no longer exists is not attached anywhere
        ctx.check()?;
        let attachment = self
            .backend
            .plane
            .describe_volume(volume_id)
            .await?
            .and_then(|volume| volume.attachment);
        if attachment.is_some() {
            return Err(CloudError::from_job(operation, &job));
        }
        if !job.succeeded {
            tracing::warn!(
                "{} reported failure but volume {} is detached: {}",
                operation,
                volume_id,
                job.result_message
            );
        }
        Ok(())
    }

    /// Grow a volume to `size_gb`
    pub async fn resize(&self, ctx: &CallContext, volume_id: &str, size_gb: u32) -> Result<()> {
        require_id("volume", volume_id)?;
        if size_gb == 0 {
            return Err(CloudError::InvalidArgument(
                "volume size must be greater than 0".to_string(),
            ));
        }

        tracing::info!("Resizing volume {} to {} GB", volume_id, size_gb);
        let request = JobRequest::ResizeVolume {
            volume_id: volume_id.to_string(),
            size_gb,
        };
        let operation = request.operation();
        let job = self.backend.run_job(ctx, request).await?;
        finished_job(operation, job, VOLUME_NOT_FOUND_MSG, volume_id)
    }

    pub async fn get(&self, ctx: &CallContext, volume_id: &str) -> Result<VolumeRecord> {
        require_id("volume", volume_id)?;
        ctx.check()?;

        tracing::debug!("Describing volume {}", volume_id);
        self.backend
            .plane
            .describe_volume(volume_id)
            .await?
            .ok_or_else(|| CloudError::NotFound(volume_id.to_string()))
    }
}
