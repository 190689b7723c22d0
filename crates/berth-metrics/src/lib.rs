//! Write-only stats sink.
//!
//! Counters and duration accumulators are cloneable handles over shared
//! atomics; the registry hands out one instrument per name and exports a
//! point-in-time snapshot. Metrics never participate in control flow;
//! they exist so operators can see offer races, skipped preemptions, and
//! realized scheduling penalties.

pub mod registry;

pub use registry::{Counter, DurationStats, MetricsRegistry};
