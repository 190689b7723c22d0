//! Victim eligibility and the greedy sufficiency walk.

use std::sync::Arc;

use tracing::debug;

use berth_filter::{AttributeAggregate, ResourceRequest, SchedulingFilter, UnusedResource};
use berth_resources::ResourceSlot;
use berth_state::{AttributeStore, HostOffer, TaskConfig, TierManager};

use crate::metrics::PreemptorMetrics;
use crate::victim::PreemptionVictim;

/// Selects a set of running tasks whose eviction would make room for a
/// pending task on one host.
pub trait PreemptionVictimFilter: Send + Sync {
    /// Returns the victims to evict, or `None` when no sufficient eligible
    /// combination exists. All `victims` and the optional `slack` offer
    /// belong to the same host; callers guarantee this by construction and
    /// it is not re-validated here.
    fn filter_preemption_victims(
        &self,
        pending: &TaskConfig,
        victims: &[PreemptionVictim],
        job_state: &AttributeAggregate,
        slack: Option<&HostOffer>,
        attributes: &dyn AttributeStore,
    ) -> Option<Vec<PreemptionVictim>>;
}

/// Production victim filter.
///
/// Greedy: walks eligible victims largest-first (by resource dominance) and
/// returns the first prefix the scheduling filter admits. That usually
/// minimizes eviction count but is not a globally optimal search.
pub struct GreedyPreemptionFilter {
    scheduling_filter: Arc<dyn SchedulingFilter>,
    tiers: TierManager,
    /// Overhead the executor adds per task; freed along with each victim and
    /// needed by the pending task.
    executor_overhead: ResourceSlot,
    metrics: PreemptorMetrics,
}

impl GreedyPreemptionFilter {
    pub fn new(
        scheduling_filter: Arc<dyn SchedulingFilter>,
        tiers: TierManager,
        executor_overhead: ResourceSlot,
        metrics: PreemptorMetrics,
    ) -> Self {
        Self {
            scheduling_filter,
            tiers,
            executor_overhead,
            metrics,
        }
    }

    /// Resources reclaimed by evicting a victim. Revocable-tier cpu is
    /// compressible and reclaims nothing; ram, disk, and ports still count.
    fn contributed_slot(&self, victim: &PreemptionVictim) -> ResourceSlot {
        let tier = self.tiers.resolve(victim.tier.as_deref(), victim.production);
        let slot = if tier.revocable {
            victim.resources.without_cpus()
        } else {
            victim.resources
        };
        slot.add(&self.executor_overhead)
    }

    /// Whether `pending` may preempt `victim` at all.
    ///
    /// A non-preemptible task may evict any preemptible one. Tasks of equal
    /// preemptibility compete on priority, but only within the same role:
    /// cross-role preemption among equals is never allowed, and
    /// non-preemptible never evicts non-preemptible outside the
    /// same-role-priority rule.
    fn eligible(&self, pending: &TaskConfig, victim: &PreemptionVictim) -> bool {
        let pending_preemptible = self.tiers.tier(pending).preemptible;
        let victim_preemptible = self
            .tiers
            .resolve(victim.tier.as_deref(), victim.production)
            .preemptible;

        if !pending_preemptible && victim_preemptible {
            true
        } else if pending_preemptible == victim_preemptible {
            victim.role == pending.job.role && pending.priority > victim.priority
        } else {
            false
        }
    }
}

impl PreemptionVictimFilter for GreedyPreemptionFilter {
    fn filter_preemption_victims(
        &self,
        pending: &TaskConfig,
        victims: &[PreemptionVictim],
        job_state: &AttributeAggregate,
        slack: Option<&HostOffer>,
        attributes: &dyn AttributeStore,
    ) -> Option<Vec<PreemptionVictim>> {
        let mut eligible: Vec<(&PreemptionVictim, ResourceSlot)> = victims
            .iter()
            .filter(|v| self.eligible(pending, v))
            .map(|v| (v, self.contributed_slot(v)))
            .collect();

        if eligible.is_empty() {
            return None;
        }

        // Largest contributions first; stable sort keeps tie order fixed
        // within this call.
        eligible.sort_by(|a, b| b.1.dominance_cmp(&a.1));

        let host = slack
            .map(|offer| offer.hostname.as_str())
            .unwrap_or(eligible[0].0.host.as_str());

        let Some(host_attributes) = attributes.host_attributes(host) else {
            // Without attribute ground truth an eviction cannot be validated;
            // skip this cycle and let a later pass retry with fresher data.
            self.metrics.record_missing_attributes();
            debug!(%host, "host attributes unavailable, skipping preemption");
            return None;
        };

        let request = ResourceRequest::new(pending.clone(), job_state.clone());
        let mut total = slack
            .map(|offer| offer.resources)
            .unwrap_or(ResourceSlot::EMPTY);
        let mut chosen = Vec::new();

        for (victim, slot) in eligible {
            total = total.add(&slot);
            chosen.push(victim.clone());

            let vetoes = self.scheduling_filter.filter(
                &UnusedResource::new(total, host_attributes.clone()),
                &request,
            );
            if vetoes.is_empty() {
                return Some(chosen);
            }
        }
        None
    }
}
