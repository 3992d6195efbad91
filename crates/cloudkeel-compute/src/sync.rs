//! Listener and member synchronisation for a balancer
//!
//! Every pass re-reads the remote state, computes a plan with the pure
//! reconcilers and applies it as at most one job per batch. The first failure
//! aborts the pass; batches already applied stay applied.
//!
//! Two syncs of the same balancer must not run concurrently.

use crate::balancer::BalancerClient;
use crate::client::{collect_pages, require_id};
use crate::listener::{ListenerPlan, ListenerSpec, ensure_listener_ids, reconcile_listeners};
use crate::member::{MemberPlan, reconcile_members};
use cloudkeel_cloud::{CallContext, JobRequest, ListenerState, MemberState, Result};

impl BalancerClient {
    /// Compute the listener changes for `balancer_id` without applying them
    pub async fn plan_listeners(
        &self,
        ctx: &CallContext,
        balancer_id: &str,
        desired: &[ListenerSpec],
    ) -> Result<ListenerPlan> {
        require_id("balancer", balancer_id)?;
        ctx.check()?;

        let actual = self.fetch_listeners(balancer_id).await?;
        let plan = reconcile_listeners(balancer_id, desired, &actual)?;
        tracing::debug!("Listener plan for {}: {}", balancer_id, plan.summary());
        Ok(plan)
    }

    /// Apply a listener plan in the order delete → create → update
    ///
    /// `host_names` are resolved only when something is created; every new
    /// listener binds all of them.
    pub async fn apply_listener_plan(
        &self,
        ctx: &CallContext,
        balancer_id: &str,
        plan: &ListenerPlan,
        host_names: &[String],
    ) -> Result<()> {
        require_id("balancer", balancer_id)?;

        if !plan.to_delete.is_empty() {
            ensure_listener_ids(&plan.to_delete)?;
            let listener_ids = plan
                .to_delete
                .iter()
                .map(|d| d.listener_id.clone())
                .collect();
            self.backend
                .run_batch(ctx, JobRequest::DeleteListeners { listener_ids })
                .await?;
            tracing::info!(
                "Deleted {} listener(s) from {}",
                plan.to_delete.len(),
                balancer_id
            );
        }

        if !plan.to_create.is_empty() {
            let host_ids = self
                .backend
                .resolver
                .resolve_many(ctx, self.network_id(), host_names)
                .await?;
            let listeners = plan
                .to_create
                .iter()
                .map(|spec| spec.to_input(&host_ids))
                .collect();
            self.backend
                .run_batch(
                    ctx,
                    JobRequest::CreateListeners {
                        balancer_id: balancer_id.to_string(),
                        listeners,
                    },
                )
                .await?;
            tracing::info!(
                "Created {} listener(s) on {} with {} member(s) each",
                plan.to_create.len(),
                balancer_id,
                host_ids.len()
            );
        }

        if !plan.to_update.is_empty() {
            let listeners = plan.to_update.iter().map(|c| c.to_update()).collect();
            self.backend
                .run_batch(ctx, JobRequest::UpdateListeners { listeners })
                .await?;
            tracing::info!(
                "Updated {} listener(s) on {}",
                plan.to_update.len(),
                balancer_id
            );
        }

        Ok(())
    }

    /// Make the listeners of `balancer_id` match `desired`
    ///
    /// Returns the plan that was applied; an empty plan means nothing changed.
    pub async fn sync_listeners(
        &self,
        ctx: &CallContext,
        balancer_id: &str,
        desired: &[ListenerSpec],
        host_names: &[String],
    ) -> Result<ListenerPlan> {
        let plan = self.plan_listeners(ctx, balancer_id, desired).await?;
        if plan.is_empty() {
            tracing::info!("Listeners of {} are up to date", balancer_id);
            return Ok(plan);
        }

        self.apply_listener_plan(ctx, balancer_id, &plan, host_names)
            .await?;
        tracing::info!("Synced listeners of {}: {}", balancer_id, plan.summary());
        Ok(plan)
    }

    /// Make the member pool of every listener of `balancer_id` hold exactly
    /// the hosts called `host_names`
    ///
    /// Pools whose listener never had members have no known port; additions
    /// to them are reported in [`MemberPlan::deferred`] instead of applied.
    pub async fn sync_members(
        &self,
        ctx: &CallContext,
        balancer_id: &str,
        host_names: &[String],
    ) -> Result<Vec<MemberPlan>> {
        require_id("balancer", balancer_id)?;
        ctx.check()?;

        let host_ids = self
            .backend
            .resolver
            .resolve_many(ctx, self.network_id(), host_names)
            .await?;
        let listeners = self.fetch_listeners(balancer_id).await?;

        let mut plans = Vec::with_capacity(listeners.len());
        for listener in &listeners {
            let members = self.fetch_members(&listener.pool_id).await?;
            let plan = reconcile_members(
                &listener.pool_id,
                &host_ids,
                &members,
                listener.backend_port,
            );

            if !plan.to_add.is_empty() {
                self.backend
                    .run_batch(
                        ctx,
                        JobRequest::AddMembers {
                            pool_id: listener.pool_id.clone(),
                            members: plan.member_inputs(),
                        },
                    )
                    .await?;
                tracing::info!(
                    "Added {} member(s) to listener {}",
                    plan.to_add.len(),
                    listener.name
                );
            }

            if !plan.to_remove.is_empty() {
                self.backend
                    .run_batch(
                        ctx,
                        JobRequest::RemoveMembers {
                            member_ids: plan.to_remove.clone(),
                        },
                    )
                    .await?;
                tracing::info!(
                    "Removed {} member(s) from listener {}",
                    plan.to_remove.len(),
                    listener.name
                );
            }

            plans.push(plan);
        }
        Ok(plans)
    }

    async fn fetch_listeners(&self, balancer_id: &str) -> Result<Vec<ListenerState>> {
        tracing::debug!("Listing listeners of {}", balancer_id);
        let plane = &self.backend.plane;
        collect_pages(self.backend.limits.listeners, move |page| {
            plane.list_listeners(balancer_id, page)
        })
        .await
    }

    async fn fetch_members(&self, pool_id: &str) -> Result<Vec<MemberState>> {
        tracing::debug!("Listing members of pool {}", pool_id);
        let plane = &self.backend.plane;
        collect_pages(self.backend.limits.members, move |page| {
            plane.list_members(pool_id, page)
        })
        .await
    }
}
