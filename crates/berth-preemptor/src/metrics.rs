//! Preemptor counters.

use berth_metrics::{Counter, MetricsRegistry};

const MISSING_ATTRIBUTES: &str = "preemption_missing_attributes";

/// Write-only preemptor instrumentation.
#[derive(Debug, Clone)]
pub struct PreemptorMetrics {
    missing_attributes: Counter,
}

impl PreemptorMetrics {
    pub fn new(registry: &MetricsRegistry) -> Self {
        Self {
            missing_attributes: registry.counter(MISSING_ATTRIBUTES),
        }
    }

    /// Counts a preemption pass abandoned because host attribute ground
    /// truth was unavailable.
    pub fn record_missing_attributes(&self) {
        self.missing_attributes.increment();
    }
}
