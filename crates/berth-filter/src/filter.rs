//! The tiered scheduling filter.

use std::collections::BTreeSet;

use berth_resources::{ResourceKind, ResourceSlot, ScalingRanges};
use berth_state::{HostAttributes, MaintenanceMode, TaskConfig, DEDICATED_ATTRIBUTE};

use crate::aggregate::AttributeAggregate;
use crate::matcher::constraint_veto;
use crate::veto::{scale, Veto};

/// The filter's view of a candidate: what is free on a host right now.
#[derive(Debug, Clone)]
pub struct UnusedResource {
    pub resources: ResourceSlot,
    pub attributes: HostAttributes,
}

impl UnusedResource {
    pub fn new(resources: ResourceSlot, attributes: HostAttributes) -> Self {
        Self {
            resources,
            attributes,
        }
    }
}

/// What a pending task needs, together with its job's aggregate placement
/// state for limit-constraint evaluation.
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub task: TaskConfig,
    pub job_state: AttributeAggregate,
}

impl ResourceRequest {
    pub fn new(task: TaskConfig, job_state: AttributeAggregate) -> Self {
        Self { task, job_state }
    }
}

/// Decides whether a task may run on a candidate resource. An empty veto set
/// means admitted.
pub trait SchedulingFilter: Send + Sync {
    fn filter(&self, resource: &UnusedResource, request: &ResourceRequest) -> BTreeSet<Veto>;
}

/// Production filter: four veto tiers evaluated from strongest rejection to
/// weakest, returning only the highest applicable tier.
#[derive(Debug, Clone, Default)]
pub struct StandardSchedulingFilter {
    /// Overhead the executor adds on top of every task's own requirements.
    executor_overhead: ResourceSlot,
    scaling: ScalingRanges,
}

impl StandardSchedulingFilter {
    pub fn new(executor_overhead: ResourceSlot, scaling: ScalingRanges) -> Self {
        Self {
            executor_overhead,
            scaling,
        }
    }

    fn dedicated_veto(&self, task: &TaskConfig, host: &HostAttributes) -> Option<Veto> {
        let dedicated = host.attribute(DEDICATED_ATTRIBUTE)?;
        let allowed = task.dedicated_values().is_some_and(|values| {
            values.contains("*") || values.iter().any(|v| dedicated.values.contains(v))
        });
        if allowed {
            None
        } else {
            Some(Veto::dedicated_host_mismatch())
        }
    }

    fn maintenance_veto(&self, mode: MaintenanceMode) -> Option<Veto> {
        match mode {
            MaintenanceMode::Draining | MaintenanceMode::Drained => Some(Veto::maintenance(mode)),
            MaintenanceMode::None | MaintenanceMode::Scheduled => None,
        }
    }

    /// First failing constraint wins, value constraints evaluated before
    /// limit constraints. The short-circuit keeps the reported reason
    /// deterministic and skips limit evaluation when a cheap value check
    /// already fails.
    fn first_constraint_veto(
        &self,
        request: &ResourceRequest,
        host: &HostAttributes,
    ) -> Option<Veto> {
        let mut ordered: Vec<_> = request.task.constraints.iter().collect();
        ordered.sort_by_key(|c| !c.is_value());

        ordered
            .into_iter()
            .find_map(|c| constraint_veto(c, &request.job_state, host))
    }

    fn resource_vetoes(&self, available: &ResourceSlot, required: &ResourceSlot) -> BTreeSet<Veto> {
        let mut vetoes = BTreeSet::new();
        let dims = [
            (ResourceKind::Cpus, available.num_cpus, required.num_cpus),
            (ResourceKind::RamMb, available.ram_mb(), required.ram_mb()),
            (ResourceKind::DiskMb, available.disk_mb(), required.disk_mb()),
            (
                ResourceKind::Ports,
                f64::from(available.num_ports),
                f64::from(required.num_ports),
            ),
        ];

        for (kind, avail, req) in dims {
            let shortfall = req - avail;
            if shortfall > 0.0 {
                let score = scale(shortfall, self.scaling.range(kind));
                vetoes.insert(Veto::insufficient_resources(kind, score));
            }
        }
        vetoes
    }
}

impl SchedulingFilter for StandardSchedulingFilter {
    fn filter(&self, resource: &UnusedResource, request: &ResourceRequest) -> BTreeSet<Veto> {
        // 1. Dedicated host (strongest rejection).
        if let Some(veto) = self.dedicated_veto(&request.task, &resource.attributes) {
            return BTreeSet::from([veto]);
        }

        // 2. Host maintenance.
        if let Some(veto) = self.maintenance_veto(resource.attributes.mode) {
            return BTreeSet::from([veto]);
        }

        // 3. Value and limit constraints.
        if let Some(veto) = self.first_constraint_veto(request, &resource.attributes) {
            return BTreeSet::from([veto]);
        }

        // 4. Resources (weakest, scored). All deficient dimensions together.
        let required = request.task.resources.add(&self.executor_overhead);
        self.resource_vetoes(&resource.resources, &required)
    }
}
