//! Listener reconciliation
//!
//! Computes which listeners of one balancer must be created, updated or
//! deleted to match a desired set. Listeners are matched by name only.
//!
//! The backend port cannot be changed in place because every bound member
//! carries it, so a port change turns into a delete of the old listener and a
//! create of the new one. The resulting plan is applied in the order
//! delete → create → update: a listener being deleted may still hold the
//! frontend port that a new one wants.

use crate::client::require_id;
use cloudkeel_cloud::{
    ActionType, CloudError, HealthCheck, ListenerInput, ListenerState, ListenerUpdate,
    MemberInput, PlanSummary, Protocol, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Load-balancing algorithm applied to every listener
pub const DEFAULT_ALGORITHM: &str = "wrr";

/// Weight given to every backend member
pub const DEFAULT_MEMBER_WEIGHT: u32 = 100;

/// Health check applied to every created or updated listener
pub fn default_health_check(protocol: Protocol) -> HealthCheck {
    HealthCheck {
        protocol,
        interval_secs: 10,
        timeout_secs: 5,
        unhealthy_threshold: 3,
        healthy_threshold: 3,
    }
}

/// Desired listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerSpec {
    /// Identity of the listener within its balancer
    pub name: String,
    pub frontend_port: u16,
    pub backend_port: u16,
    pub protocol: Protocol,
}

impl ListenerSpec {
    pub fn new(
        name: impl Into<String>,
        frontend_port: u16,
        backend_port: u16,
        protocol: Protocol,
    ) -> Self {
        Self {
            name: name.into(),
            frontend_port,
            backend_port,
            protocol,
        }
    }

    /// Request payload creating this listener with the given members
    pub fn to_input(&self, host_ids: &[String]) -> ListenerInput {
        ListenerInput {
            name: self.name.clone(),
            protocol: self.protocol,
            backend_protocol: self.protocol,
            frontend_port: self.frontend_port,
            algorithm: DEFAULT_ALGORITHM.to_string(),
            health_check: default_health_check(self.protocol),
            members: host_ids
                .iter()
                .map(|host_id| MemberInput {
                    host_id: host_id.clone(),
                    port: self.backend_port,
                    weight: DEFAULT_MEMBER_WEIGHT,
                })
                .collect(),
        }
    }
}

/// In-place change of an existing listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerChange {
    /// Remote id of the listener being updated
    pub listener_id: String,
    pub spec: ListenerSpec,
}

impl ListenerChange {
    pub fn to_update(&self) -> ListenerUpdate {
        ListenerUpdate {
            listener_id: self.listener_id.clone(),
            name: self.spec.name.clone(),
            protocol: self.spec.protocol,
            backend_protocol: self.spec.protocol,
            frontend_port: self.spec.frontend_port,
            algorithm: DEFAULT_ALGORITHM.to_string(),
            health_check: default_health_check(self.spec.protocol),
        }
    }
}

/// Existing listener scheduled for deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerDeletion {
    pub listener_id: String,
    pub name: String,

    /// Extra copy of a name the balancer reports more than once
    pub duplicate: bool,
}

/// Outcome of a listener reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerPlan {
    pub to_create: Vec<ListenerSpec>,
    pub to_update: Vec<ListenerChange>,
    pub to_delete: Vec<ListenerDeletion>,

    /// Names of listeners that already match
    pub unchanged: Vec<String>,
}

impl ListenerPlan {
    /// True when applying the plan would not touch the balancer
    pub fn is_empty(&self) -> bool {
        !self.summary().has_changes()
    }

    /// What the plan does to the listener called `name`
    ///
    /// Names the plan does not mention are reported as [`ActionType::NoOp`].
    /// Removing a duplicate copy does not count against the kept listener.
    pub fn action_for(&self, name: &str) -> ActionType {
        let created = self.to_create.iter().any(|l| l.name == name);
        let deleted = self
            .to_delete
            .iter()
            .any(|l| !l.duplicate && l.name == name);
        match (created, deleted) {
            (true, true) => ActionType::Recreate,
            (true, false) => ActionType::Create,
            (false, true) => ActionType::Delete,
            (false, false) if self.to_update.iter().any(|c| c.spec.name == name) => {
                ActionType::Update
            }
            (false, false) => ActionType::NoOp,
        }
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.to_create.len(),
            update: self.to_update.len(),
            delete: self.to_delete.len(),
            no_change: self.unchanged.len(),
        }
    }
}

/// Diff `desired` listeners against the `actual` listeners of one balancer
///
/// An empty `desired` is a request to remove every listener. Desired entries
/// with an empty name, or a name already seen, are logged and skipped. When
/// the balancer reports several listeners with one name, the first is kept as
/// the match candidate and the others are deleted.
///
/// # Errors
/// [`CloudError::InvalidArgument`] when `balancer_id` is empty.
pub fn reconcile_listeners(
    balancer_id: &str,
    desired: &[ListenerSpec],
    actual: &[ListenerState],
) -> Result<ListenerPlan> {
    require_id("balancer", balancer_id)?;

    let mut plan = ListenerPlan::default();

    let mut existing: HashMap<&str, &ListenerState> = HashMap::with_capacity(actual.len());
    for listener in actual {
        if existing.contains_key(listener.name.as_str()) {
            tracing::warn!(
                "Balancer {} has more than one listener named {}, deleting {}",
                balancer_id,
                listener.name,
                listener.id
            );
            plan.to_delete.push(deletion(listener, true));
            continue;
        }
        existing.insert(listener.name.as_str(), listener);
    }

    let mut seen = HashSet::with_capacity(desired.len());
    for spec in desired {
        if spec.name.is_empty() {
            tracing::warn!(
                "Skipping listener with empty name on balancer {}",
                balancer_id
            );
            continue;
        }
        if !seen.insert(spec.name.as_str()) {
            tracing::warn!(
                "Skipping duplicate listener {} on balancer {}",
                spec.name,
                balancer_id
            );
            continue;
        }

        match existing.remove(spec.name.as_str()) {
            None => plan.to_create.push(spec.clone()),
            Some(current) => match current.backend_port {
                Some(port) if port != spec.backend_port => {
                    plan.to_delete.push(deletion(current, false));
                    plan.to_create.push(spec.clone());
                }
                _ if current.frontend_port != spec.frontend_port
                    || current.protocol != spec.protocol =>
                {
                    plan.to_update.push(ListenerChange {
                        listener_id: current.id.clone(),
                        spec: spec.clone(),
                    });
                }
                _ => plan.unchanged.push(spec.name.clone()),
            },
        }
    }

    // Whatever was not claimed is no longer desired; keep the remote order
    for listener in actual {
        if existing
            .get(listener.name.as_str())
            .is_some_and(|l| l.id == listener.id)
        {
            plan.to_delete.push(deletion(listener, false));
        }
    }

    Ok(plan)
}

fn deletion(listener: &ListenerState, duplicate: bool) -> ListenerDeletion {
    ListenerDeletion {
        listener_id: listener.id.clone(),
        name: listener.name.clone(),
        duplicate,
    }
}

// Used by the orchestrator to reject batches built by hand
pub(crate) fn ensure_listener_ids(deletions: &[ListenerDeletion]) -> Result<()> {
    if deletions.iter().any(|d| d.listener_id.is_empty()) {
        return Err(CloudError::InvalidArgument(
            "listener deletion without id".to_string(),
        ));
    }
    Ok(())
}
