//! Throttled per-equivalence-class scheduling loops.
//!
//! Pending tasks are partitioned into groups of identical scheduling
//! configuration. Each group runs one independent, self-rescheduling attempt
//! loop: try the oldest queued task, back off on failure, reset on success.
//! A global rate limiter bounds aggregate attempt throughput so a large job
//! cannot starve a small one.
//!
//! # Components
//!
//! - **`groups`** — `TaskGroups`, the group map and per-group attempt loops
//! - **`group`** — a single group's queue/penalty state
//! - **`backoff`** — penalty growth strategies
//! - **`throttle`** — the aggregate rate limiter
//! - **`error`** — configuration validation failures

pub mod backoff;
pub mod error;
pub mod group;
pub mod groups;
pub mod throttle;

pub use backoff::{BackoffStrategy, TruncatedBinaryBackoff};
pub use error::{SchedulingError, SchedulingResult};
pub use group::TaskGroup;
pub use groups::{
    BoxFuture, FlatRescheduleCalculator, PendingTask, RescheduleCalculator, TaskGroups,
    TaskGroupsSettings, TaskScheduler,
};
pub use throttle::RateLimiter;
