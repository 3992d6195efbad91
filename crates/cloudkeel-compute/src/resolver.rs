//! Host name to host id resolution

use crate::client::collect_pages;
use cloudkeel_cloud::{CallContext, CloudError, ControlPlane, HostFilter, Page, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Maps human-readable host names to the remote host ids
#[derive(Clone)]
pub struct NameResolver {
    plane: Arc<dyn ControlPlane>,
    page_limit: u32,
}

impl NameResolver {
    pub fn new(plane: Arc<dyn ControlPlane>, page_limit: u32) -> Self {
        Self { plane, page_limit }
    }

    /// Resolve one host name
    ///
    /// The listing is filtered by name on the server side, but only an exact
    /// match among the returned candidates counts.
    pub async fn resolve_one(&self, ctx: &CallContext, name: &str) -> Result<String> {
        ctx.check()?;
        tracing::debug!("Resolving host {}", name);
        let hosts = self
            .plane
            .list_hosts(&HostFilter::by_name(name), Page::first(self.page_limit))
            .await?;

        hosts
            .into_iter()
            .find(|h| h.name == name)
            .map(|h| h.id)
            .ok_or_else(|| CloudError::NotFound(format!("host {}", name)))
    }

    /// Resolve several host names within a network
    ///
    /// Names without a matching host are logged and left out; the result keeps
    /// the order of `names` without duplicates. When several hosts share a
    /// name, the last one listed wins. An empty `names` returns immediately
    /// without listing hosts.
    pub async fn resolve_many(
        &self,
        ctx: &CallContext,
        network_id: Option<&str>,
        names: &[String],
    ) -> Result<Vec<String>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        ctx.check()?;

        tracing::debug!(
            "Resolving {} hosts in network {}",
            names.len(),
            network_id.unwrap_or("*")
        );
        let filter = HostFilter::in_network(network_id);
        let hosts =
            collect_pages(self.page_limit, |page| self.plane.list_hosts(&filter, page)).await?;

        let mut by_name: HashMap<&str, &str> = HashMap::with_capacity(hosts.len());
        for host in &hosts {
            by_name.insert(host.name.as_str(), host.id.as_str());
        }

        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            match by_name.get(name.as_str()) {
                Some(id) => {
                    if seen.insert(*id) {
                        ids.push(id.to_string());
                    }
                }
                None => tracing::warn!("Host {} not found, skipping", name),
            }
        }
        Ok(ids)
    }
}
