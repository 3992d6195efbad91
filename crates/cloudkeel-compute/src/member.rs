//! Backend pool member reconciliation

use crate::listener::DEFAULT_MEMBER_WEIGHT;
use cloudkeel_cloud::{MemberInput, MemberState};
use std::collections::HashSet;

/// Changes needed to bring one pool in line with the desired hosts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberPlan {
    pub pool_id: String,

    /// Port new members are bound to, `None` when the listener has no members
    /// to learn it from
    pub port: Option<u16>,

    /// Host ids to add
    pub to_add: Vec<String>,

    /// Member ids to remove
    pub to_remove: Vec<String>,

    /// Host ids that should be added but cannot be without a port
    pub deferred: Vec<String>,
}

impl MemberPlan {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Request payload for [`MemberPlan::to_add`]
    ///
    /// Empty when there is nothing to add or no known port.
    pub fn member_inputs(&self) -> Vec<MemberInput> {
        let Some(port) = self.port else {
            return Vec::new();
        };
        self.to_add
            .iter()
            .map(|host_id| MemberInput {
                host_id: host_id.clone(),
                port,
                weight: DEFAULT_MEMBER_WEIGHT,
            })
            .collect()
    }
}

/// Diff the desired host ids against the current members of a pool
///
/// An empty `desired` removes every member. Without a `bound_port` the
/// additions are deferred; removals are still planned.
pub fn reconcile_members(
    pool_id: &str,
    desired: &[String],
    actual: &[MemberState],
    bound_port: Option<u16>,
) -> MemberPlan {
    let wanted: HashSet<&str> = desired.iter().map(String::as_str).collect();
    let present: HashSet<&str> = actual.iter().map(|m| m.host_id.as_str()).collect();

    let mut added = HashSet::new();
    let missing: Vec<String> = desired
        .iter()
        .filter(|id| !present.contains(id.as_str()) && added.insert(id.as_str()))
        .cloned()
        .collect();

    let to_remove = actual
        .iter()
        .filter(|m| !wanted.contains(m.host_id.as_str()))
        .map(|m| m.id.clone())
        .collect();

    let (to_add, deferred) = match bound_port {
        Some(_) => (missing, Vec::new()),
        None => {
            if !missing.is_empty() {
                tracing::warn!(
                    "Pool {} has no bound port, deferring {} member(s)",
                    pool_id,
                    missing.len()
                );
            }
            (Vec::new(), missing)
        }
    };

    MemberPlan {
        pool_id: pool_id.to_string(),
        port: bound_port,
        to_add,
        to_remove,
        deferred,
    }
}
