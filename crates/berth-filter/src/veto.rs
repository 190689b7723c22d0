//! Typed, scored placement rejections.

use serde::{Deserialize, Serialize};

use berth_resources::ResourceKind;
use berth_state::MaintenanceMode;

/// Upper bound on veto scores. Hard mismatches (dedicated host, maintenance,
/// constraints) always carry this score; resource shortfalls scale up to it.
pub const MAX_SCORE: u32 = 1000;

/// The kind of mismatch a veto reports, in descending precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VetoKind {
    DedicatedHostMismatch,
    Maintenance,
    ConstraintMismatch,
    LimitNotSatisfied,
    InsufficientResources,
}

/// A scored reason a candidate placement is unusable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Veto {
    pub kind: VetoKind,
    pub reason: String,
    pub score: u32,
}

impl Veto {
    pub fn dedicated_host_mismatch() -> Self {
        Self {
            kind: VetoKind::DedicatedHostMismatch,
            reason: "host is dedicated to another role".to_string(),
            score: MAX_SCORE,
        }
    }

    pub fn maintenance(mode: MaintenanceMode) -> Self {
        Self {
            kind: VetoKind::Maintenance,
            reason: format!("host is in {mode} maintenance"),
            score: MAX_SCORE,
        }
    }

    pub fn constraint_mismatch(name: &str) -> Self {
        Self {
            kind: VetoKind::ConstraintMismatch,
            reason: format!("constraint not satisfied: {name}"),
            score: MAX_SCORE,
        }
    }

    pub fn limit_not_satisfied(name: &str) -> Self {
        Self {
            kind: VetoKind::LimitNotSatisfied,
            reason: format!("limit not satisfied: {name}"),
            score: MAX_SCORE,
        }
    }

    pub fn insufficient_resources(kind: ResourceKind, score: u32) -> Self {
        Self {
            kind: VetoKind::InsufficientResources,
            reason: format!("insufficient {}", kind.name()),
            score,
        }
    }
}

/// Scales a resource shortfall into a veto score: linear in the shortfall,
/// floored to an integer, clamped to `MAX_SCORE`.
pub(crate) fn scale(shortfall: f64, range: f64) -> u32 {
    let scaled = (MAX_SCORE as f64 * shortfall / range).floor();
    scaled.clamp(0.0, MAX_SCORE as f64) as u32
}
