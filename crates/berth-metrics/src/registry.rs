//! Counter registry backed by atomics.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A monotonically increasing counter. Cloning yields a handle to the same
/// underlying value.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.add(1);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Decrement without underflow; used for gauge-style counts such as
    /// outstanding offers.
    pub fn decrement(&self) {
        let _ = self
            .value
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    pub fn set(&self, n: u64) {
        self.value.store(n, Ordering::Relaxed);
    }

    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Accumulates observed durations as an event count plus a total in
/// milliseconds. Cloning yields a handle to the same accumulator.
#[derive(Debug, Clone, Default)]
pub struct DurationStats {
    events: Arc<AtomicU64>,
    total_ms: Arc<AtomicU64>,
}

impl DurationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(&self, d: Duration) {
        self.events.fetch_add(1, Ordering::Relaxed);
        self.total_ms.fetch_add(d.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.events.load(Ordering::Relaxed)
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms.load(Ordering::Relaxed)
    }
}

/// Named instrument registry. One instrument exists per name; asking for the
/// same name twice returns handles to the same value.
#[derive(Debug, Clone, Default)]
pub struct MetricsRegistry {
    counters: Arc<Mutex<BTreeMap<String, Counter>>>,
    durations: Arc<Mutex<BTreeMap<String, DurationStats>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> Counter {
        let mut counters = self.counters.lock().unwrap();
        counters.entry(name.to_string()).or_default().clone()
    }

    pub fn duration_stats(&self, name: &str) -> DurationStats {
        let mut durations = self.durations.lock().unwrap();
        durations.entry(name.to_string()).or_default().clone()
    }

    /// Point-in-time export of every registered value. Duration stats export
    /// as `<name>_events` and `<name>_ms`.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        let mut out = BTreeMap::new();
        for (name, counter) in self.counters.lock().unwrap().iter() {
            out.insert(name.clone(), counter.value());
        }
        for (name, stats) in self.durations.lock().unwrap().iter() {
            out.insert(format!("{name}_events"), stats.count());
            out.insert(format!("{name}_ms"), stats.total_ms());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_handles_share_state() {
        let registry = MetricsRegistry::new();
        let a = registry.counter("races");
        let b = registry.counter("races");

        a.increment();
        b.add(2);
        assert_eq!(a.value(), 3);
    }

    #[test]
    fn counter_decrement_saturates_at_zero() {
        let c = Counter::new();
        c.decrement();
        assert_eq!(c.value(), 0);

        c.add(2);
        c.decrement();
        assert_eq!(c.value(), 1);
    }

    #[test]
    fn duration_stats_accumulate() {
        let stats = DurationStats::new();
        stats.accumulate(Duration::from_millis(15));
        stats.accumulate(Duration::from_millis(25));

        assert_eq!(stats.count(), 2);
        assert_eq!(stats.total_ms(), 40);
    }

    #[test]
    fn snapshot_exports_all_instruments() {
        let registry = MetricsRegistry::new();
        registry.counter("races").add(4);
        registry
            .duration_stats("penalty")
            .accumulate(Duration::from_millis(10));

        let snap = registry.snapshot();
        assert_eq!(snap["races"], 4);
        assert_eq!(snap["penalty_events"], 1);
        assert_eq!(snap["penalty_ms"], 10);
    }

    #[test]
    fn concurrent_increments_are_counted() {
        use std::thread;

        let c = Counter::new();
        let mut handles = vec![];
        for _ in 0..4 {
            let c = c.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    c.increment();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.value(), 400);
    }
}
