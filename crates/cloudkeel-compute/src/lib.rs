//! Volume and load balancer provisioning for cloudkeel
//!
//! Resource clients on top of a [`ControlPlane`](cloudkeel_cloud::ControlPlane):
//! every mutation is submitted as a job and awaited through the shared
//! [`JobWaiter`](cloudkeel_cloud::JobWaiter).
//!
//! # Features
//!
//! - Volume create, delete, attach, detach and resize
//! - Balancer create, delete and address lookup
//! - Declarative listener sync: desired listeners are diffed against the
//!   balancer and applied as delete → create → update batches
//! - Backend member sync for every listener of a balancer
//! - Host name resolution
//!
//! # Example
//!
//! ```ignore
//! use cloudkeel_compute::{Client, ListenerSpec};
//! use cloudkeel_cloud::{CallContext, Protocol};
//!
//! let settings = cloudkeel_config::load_settings()?;
//! let client = Client::from_settings(plane, &settings);
//! let ctx = CallContext::new().with_timeout(std::time::Duration::from_secs(600));
//!
//! let desired = vec![
//!     ListenerSpec::new("http", 5090, 5092, Protocol::Tcp),
//!     ListenerSpec::new("rtmp", 5080, 5082, Protocol::Tcp),
//! ];
//! let hosts = vec!["web-1".to_string(), "web-2".to_string()];
//!
//! let balancers = client.balancers();
//! let plan = balancers.sync_listeners(&ctx, &balancer_id, &desired, &hosts).await?;
//! println!("{}", plan.summary());
//!
//! balancers.sync_members(&ctx, &balancer_id, &hosts).await?;
//! ```

pub mod balancer;
pub mod client;
pub mod listener;
pub mod member;
pub mod resolver;
pub mod sync;
pub mod volume;

pub use balancer::{
    BALANCER_NOT_FOUND_CODE, BALANCER_NOT_FOUND_MSG, BalancerClient, CreateBalancer,
};
pub use client::{Client, ClientConfig, PageLimits};
pub use listener::{
    DEFAULT_ALGORITHM, DEFAULT_MEMBER_WEIGHT, ListenerChange, ListenerDeletion, ListenerPlan,
    ListenerSpec, default_health_check, reconcile_listeners,
};
pub use member::{MemberPlan, reconcile_members};
pub use resolver::NameResolver;
pub use volume::{VOLUME_NOT_FOUND_MSG, VolumeClient};
