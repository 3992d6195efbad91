//! cloudkeel control plane abstraction
//!
//! This crate defines the contract between cloudkeel and a remote,
//! job-based infrastructure API, plus the job-completion protocol every
//! mutation goes through.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                cloudkeel-compute                 │
//! │   volumes · balancers · listener/member sync     │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                cloudkeel-cloud                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │        trait ControlPlane { ... }         │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │  JobWaiter   │  │ CallContext  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!          ┌────────▼────────┐
//!          │ transport / SDK │
//!          └─────────────────┘
//! ```

pub mod action;
pub mod context;
pub mod error;
pub mod job;
pub mod plane;

// Re-exports
pub use action::{ActionType, PlanSummary};
pub use context::CallContext;
pub use error::{CloudError, Result};
pub use job::{DEFAULT_POLL_INTERVAL, Job, JobWaiter, PollConfig};
pub use plane::{
    AddressType, BalancerRecord, ControlPlane, CreateBalancerRequest, CreateVolumeRequest,
    HealthCheck, HostFilter, HostRecord, JobRequest, JobScope, ListenerInput, ListenerState,
    ListenerUpdate, MemberInput, MemberState, Page, Protocol, VolumeAttachment, VolumeRecord,
};
