//! Control plane error types

use crate::job::Job;
use thiserror::Error;

/// Errors surfaced by the control plane layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloudError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Application-level rejection reported by the remote API.
    #[error("Remote error {code}: {message}")]
    Remote { code: i64, message: String },

    /// A job reached a terminal state without succeeding.
    #[error("Failed to {operation}: {message}")]
    JobFailed {
        operation: String,
        message: String,
        resource_id: Option<String>,
    },

    #[error("Querying job {job_id} failed: {reason}")]
    JobQueryFailed { job_id: String, reason: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl CloudError {
    pub fn job_failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        CloudError::JobFailed {
            operation: operation.into(),
            message: message.into(),
            resource_id: None,
        }
    }

    /// [`CloudError::JobFailed`] for a terminal job, keeping the resource id
    /// it reported
    pub fn from_job(operation: impl Into<String>, job: &Job) -> Self {
        CloudError::JobFailed {
            operation: operation.into(),
            message: job.result_message.clone(),
            resource_id: job.resource_id.clone().filter(|id| !id.is_empty()),
        }
    }

    /// Resource id reported by a failed job, if any
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            CloudError::JobFailed { resource_id, .. } => resource_id.as_deref(),
            _ => None,
        }
    }

    /// True for [`CloudError::NotFound`], so callers can treat a delete of an
    /// absent resource as done.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound(_))
    }

    /// Whether the whole call can be retried as is.
    ///
    /// Covers transport failures, failed job queries and timeouts. A job
    /// that was already accepted keeps running remotely.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CloudError::Transport(_) | CloudError::JobQueryFailed { .. } | CloudError::Timeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
