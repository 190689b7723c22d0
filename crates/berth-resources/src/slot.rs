//! Aggregate resource vectors.
//!
//! A `ResourceSlot` is the unit of resource accounting everywhere in the
//! scheduler: offer capacity, task requirements, executor overhead, and
//! preemption running totals are all slots. Slots are immutable; arithmetic
//! returns new values.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Bytes in one mebibyte, for the MB-denominated constructors and accessors.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// A single task/host aggregate resource vector.
///
/// CPU is fractional (cores), ram and disk are bytes, ports is a count of
/// distinct ports. Values are never NaN; they come from configuration and
/// offer payloads, both of which are finite.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceSlot {
    pub num_cpus: f64,
    pub ram_bytes: u64,
    pub disk_bytes: u64,
    pub num_ports: u32,
}

impl ResourceSlot {
    /// The zero slot.
    pub const EMPTY: ResourceSlot = ResourceSlot {
        num_cpus: 0.0,
        ram_bytes: 0,
        disk_bytes: 0,
        num_ports: 0,
    };

    pub fn new(num_cpus: f64, ram_bytes: u64, disk_bytes: u64, num_ports: u32) -> Self {
        Self {
            num_cpus,
            ram_bytes,
            disk_bytes,
            num_ports,
        }
    }

    /// Convenience constructor taking ram/disk in mebibytes.
    pub fn from_mb(num_cpus: f64, ram_mb: u64, disk_mb: u64, num_ports: u32) -> Self {
        Self::new(
            num_cpus,
            ram_mb * BYTES_PER_MB,
            disk_mb * BYTES_PER_MB,
            num_ports,
        )
    }

    pub fn ram_mb(&self) -> f64 {
        self.ram_bytes as f64 / BYTES_PER_MB as f64
    }

    pub fn disk_mb(&self) -> f64 {
        self.disk_bytes as f64 / BYTES_PER_MB as f64
    }

    /// Component-wise sum.
    pub fn add(&self, other: &ResourceSlot) -> ResourceSlot {
        ResourceSlot {
            num_cpus: self.num_cpus + other.num_cpus,
            ram_bytes: self.ram_bytes + other.ram_bytes,
            disk_bytes: self.disk_bytes + other.disk_bytes,
            num_ports: self.num_ports + other.num_ports,
        }
    }

    /// Component-wise difference. Unsigned dimensions saturate at zero;
    /// cpu may go negative to preserve shortfall information.
    pub fn subtract(&self, other: &ResourceSlot) -> ResourceSlot {
        ResourceSlot {
            num_cpus: self.num_cpus - other.num_cpus,
            ram_bytes: self.ram_bytes.saturating_sub(other.ram_bytes),
            disk_bytes: self.disk_bytes.saturating_sub(other.disk_bytes),
            num_ports: self.num_ports.saturating_sub(other.num_ports),
        }
    }

    /// Component-wise maximum of two slots.
    pub fn max_elements(a: &ResourceSlot, b: &ResourceSlot) -> ResourceSlot {
        ResourceSlot {
            num_cpus: a.num_cpus.max(b.num_cpus),
            ram_bytes: a.ram_bytes.max(b.ram_bytes),
            disk_bytes: a.disk_bytes.max(b.disk_bytes),
            num_ports: a.num_ports.max(b.num_ports),
        }
    }

    /// Sums all slots in `iter`.
    pub fn sum<'a, I: IntoIterator<Item = &'a ResourceSlot>>(iter: I) -> ResourceSlot {
        iter.into_iter()
            .fold(ResourceSlot::EMPTY, |acc, s| acc.add(s))
    }

    /// The same slot with cpu zeroed. Revocable-tier cpu is compressible and
    /// cannot be reclaimed through preemption; ram, disk, and ports can.
    pub fn without_cpus(&self) -> ResourceSlot {
        ResourceSlot {
            num_cpus: 0.0,
            ..*self
        }
    }

    /// Dominance comparator: a slot is `Greater` than another iff every
    /// dimension is greater or equal with at least one strictly greater
    /// (symmetrically for `Less`). Identical and incomparable slots both
    /// compare `Equal`, so a stable sort keeps their relative order.
    pub fn dominance_cmp(&self, other: &ResourceSlot) -> Ordering {
        let dims = [
            self.num_cpus.total_cmp(&other.num_cpus),
            self.ram_bytes.cmp(&other.ram_bytes),
            self.disk_bytes.cmp(&other.disk_bytes),
            self.num_ports.cmp(&other.num_ports),
        ];

        if dims.iter().all(|c| *c == Ordering::Equal) {
            return Ordering::Equal;
        }
        if dims.iter().all(|c| *c != Ordering::Less) {
            return Ordering::Greater;
        }
        if dims.iter().all(|c| *c != Ordering::Greater) {
            return Ordering::Less;
        }
        Ordering::Equal
    }
}

// Slots never hold NaN, so equality is total.
impl Eq for ResourceSlot {}

impl Hash for ResourceSlot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.num_cpus.to_bits().hash(state);
        self.ram_bytes.hash(state);
        self.disk_bytes.hash(state);
        self.num_ports.hash(state);
    }
}
