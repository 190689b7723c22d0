//! Named resource dimensions and veto score scaling ranges.

use serde::{Deserialize, Serialize};

/// The four resource dimensions tracked by a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Cpus,
    RamMb,
    DiskMb,
    Ports,
}

impl ResourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Cpus => "cpus",
            ResourceKind::RamMb => "ram_mb",
            ResourceKind::DiskMb => "disk_mb",
            ResourceKind::Ports => "ports",
        }
    }
}

/// Per-dimension ranges used to scale insufficient-resource veto scores.
///
/// A shortfall equal to the range (or larger) maps to the maximum veto
/// score; smaller shortfalls scale linearly. Ram and disk ranges are in
/// mebibytes. The defaults are deployment-tunable, so tests assert
/// monotonicity and clamping rather than exact scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalingRanges {
    pub cpus: f64,
    pub ram_mb: f64,
    pub disk_mb: f64,
    pub ports: f64,
}

impl Default for ScalingRanges {
    fn default() -> Self {
        Self {
            cpus: 16.0,
            ram_mb: 24_576.0,
            disk_mb: 102_400.0,
            ports: 16.0,
        }
    }
}

impl ScalingRanges {
    /// The scaling range for one dimension.
    pub fn range(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Cpus => self.cpus,
            ResourceKind::RamMb => self.ram_mb,
            ResourceKind::DiskMb => self.disk_mb,
            ResourceKind::Ports => self.ports,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(ResourceKind::Cpus.name(), "cpus");
        assert_eq!(ResourceKind::RamMb.name(), "ram_mb");
        assert_eq!(ResourceKind::DiskMb.name(), "disk_mb");
        assert_eq!(ResourceKind::Ports.name(), "ports");
    }

    #[test]
    fn default_ranges_are_positive() {
        let ranges = ScalingRanges::default();
        for kind in [
            ResourceKind::Cpus,
            ResourceKind::RamMb,
            ResourceKind::DiskMb,
            ResourceKind::Ports,
        ] {
            assert!(ranges.range(kind) > 0.0);
        }
    }
}
