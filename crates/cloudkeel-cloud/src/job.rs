//! Asynchronous job handles and the polling waiter

use crate::context::CallContext;
use crate::error::{CloudError, Result};
use crate::plane::{ControlPlane, JobScope};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Default interval between two job status queries
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Handle to one asynchronous remote mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Opaque handle assigned by the remote system
    pub id: String,

    /// Set once the job is terminal
    pub done: bool,

    /// Outcome, only meaningful when `done`
    pub succeeded: bool,

    /// Diagnostic text from the remote system
    pub result_message: String,

    /// Resource produced by the job. Can be set even when the job failed.
    pub resource_id: Option<String>,
}

impl Job {
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            done: false,
            succeeded: false,
            result_message: String::new(),
            resource_id: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.done && !self.succeeded
    }
}

/// Polling configuration for [`JobWaiter`]
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Constant delay between two status queries
    pub interval: Duration,

    /// Give up with [`CloudError::Timeout`] after this long; `None` waits forever
    pub max_wait: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
        }
    }
}

/// Waits for jobs to reach a terminal state
#[derive(Clone)]
pub struct JobWaiter {
    plane: Arc<dyn ControlPlane>,
    config: PollConfig,
}

impl JobWaiter {
    pub fn new(plane: Arc<dyn ControlPlane>, config: PollConfig) -> Self {
        Self { plane, config }
    }

    /// Poll `job` at a constant interval until it is done
    ///
    /// Returns the terminal job whatever its outcome; callers inspect
    /// `succeeded` and `resource_id` themselves.
    ///
    /// # Errors
    /// * [`CloudError::JobQueryFailed`] when a status query fails in transport
    /// * [`CloudError::Remote`] when the query is rejected by the remote API
    /// * [`CloudError::Cancelled`] when `ctx` is cancelled or past its deadline
    /// * [`CloudError::Timeout`] when `max_wait` is exceeded
    pub async fn wait(&self, ctx: &CallContext, job: Job, scope: &JobScope) -> Result<Job> {
        let started = Instant::now();
        let mut job = job;

        loop {
            if job.done {
                tracing::debug!(
                    job_id = %job.id,
                    succeeded = job.succeeded,
                    "Job finished: {}",
                    job.result_message
                );
                return Ok(job);
            }

            if let Some(max_wait) = self.config.max_wait {
                if started.elapsed() >= max_wait {
                    return Err(CloudError::Timeout(format!(
                        "job {} still running after {:?}",
                        job.id, max_wait
                    )));
                }
            }

            tracing::trace!(job_id = %job.id, "Waiting for job");
            ctx.sleep(self.config.interval).await?;

            job = match self.plane.query_job(&job.id, scope).await {
                Ok(next) => next,
                Err(CloudError::Transport(reason)) => {
                    return Err(CloudError::JobQueryFailed {
                        job_id: job.id.clone(),
                        reason,
                    });
                }
                Err(e) => return Err(e),
            };
        }
    }
}
