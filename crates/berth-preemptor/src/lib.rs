//! Preemption victim selection.
//!
//! When no offer can fit a pending task, the admission-escalation policy may
//! ask this crate which already-running, lower-priority tasks on a host
//! would free enough room. The answer is a greedy, dominance-ordered prefix
//! of the eligible victims, validated with the same `SchedulingFilter` the
//! normal matching path uses. All reasoning is scoped to one host.
//!
//! # Components
//!
//! - **`victim`** — the read-only running-task projection
//! - **`filter`** — eligibility rules and the greedy sufficiency walk
//! - **`metrics`** — preemptor counters

pub mod filter;
pub mod metrics;
pub mod victim;

pub use filter::{GreedyPreemptionFilter, PreemptionVictimFilter};
pub use metrics::PreemptorMetrics;
pub use victim::PreemptionVictim;
