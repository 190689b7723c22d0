//! Scheduling tier resolution.
//!
//! A tier names a scheduling class controlling whether a task may be
//! preempted and whether its resources are revocable. Tasks reference tiers
//! by name; the mapping is deployment configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::types::TaskConfig;

/// Traits of one scheduling tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TierInfo {
    pub preemptible: bool,
    pub revocable: bool,
}

impl TierInfo {
    pub const fn new(preemptible: bool, revocable: bool) -> Self {
        Self {
            preemptible,
            revocable,
        }
    }
}

/// Errors from tier configuration validation.
#[derive(Debug, Error)]
pub enum TierConfigError {
    #[error("tier configuration cannot be empty")]
    Empty,
}

/// The configured tier name → traits mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    tiers: BTreeMap<String, TierInfo>,
}

impl TierConfig {
    pub fn new(tiers: BTreeMap<String, TierInfo>) -> Result<Self, TierConfigError> {
        if tiers.is_empty() {
            return Err(TierConfigError::Empty);
        }
        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &BTreeMap<String, TierInfo> {
        &self.tiers
    }
}

/// Resolves a task's tier traits from its configuration.
#[derive(Debug, Clone)]
pub struct TierManager {
    config: TierConfig,
}

impl TierManager {
    pub fn new(config: TierConfig) -> Self {
        Self { config }
    }

    /// Tier traits for a task.
    pub fn tier(&self, task: &TaskConfig) -> TierInfo {
        self.resolve(task.tier.as_deref(), task.production)
    }

    /// Resolves tier traits from a tier name and production flag.
    ///
    /// A configured name gets that tier's traits. A missing name, or a
    /// stale config naming a tier that has since been removed, resolves
    /// implicitly: production tasks are non-preemptible, everything else is
    /// preemptible, and neither is revocable. A stale name must not wedge
    /// scheduling for the whole job.
    pub fn resolve(&self, name: Option<&str>, production: bool) -> TierInfo {
        match name {
            Some(name) => match self.config.tiers.get(name) {
                Some(info) => *info,
                None => {
                    warn!(tier = %name, "unknown tier name, using implicit tier");
                    TierInfo::new(!production, false)
                }
            },
            None => TierInfo::new(!production, false),
        }
    }
}
