//! Running-task projection used for preemption reasoning.

use serde::{Deserialize, Serialize};

use berth_resources::ResourceSlot;
use berth_state::TaskConfig;

/// A read-only view of a running task, sufficient to decide whether evicting
/// it would help a pending task. Never mutated; rebuilt per invocation from
/// the task store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreemptionVictim {
    pub task_id: String,
    pub host: String,
    pub role: String,
    pub production: bool,
    pub priority: i32,
    pub tier: Option<String>,
    pub resources: ResourceSlot,
}

impl PreemptionVictim {
    pub fn from_task(task_id: &str, config: &TaskConfig, host: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            host: host.to_string(),
            role: config.job.role.clone(),
            production: config.production,
            priority: config.priority,
            tier: config.tier.clone(),
            resources: config.resources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_state::JobKey;

    #[test]
    fn projection_copies_scheduling_fields() {
        let config = TaskConfig {
            job: JobKey::new("web", "prod", "api"),
            priority: 7,
            production: true,
            tier: Some("preferred".to_string()),
            resources: ResourceSlot::from_mb(1.0, 512, 0, 0),
            constraints: Vec::new(),
        };

        let victim = PreemptionVictim::from_task("task-1", &config, "host-1");
        assert_eq!(victim.role, "web");
        assert_eq!(victim.priority, 7);
        assert!(victim.production);
        assert_eq!(victim.tier.as_deref(), Some("preferred"));
        assert_eq!(victim.host, "host-1");
    }
}
