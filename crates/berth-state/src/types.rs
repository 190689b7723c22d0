//! Core domain types: jobs, tasks, constraints, hosts, and offers.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use berth_resources::ResourceSlot;

/// Host attribute name marking a host as dedicated to a role.
pub const DEDICATED_ATTRIBUTE: &str = "dedicated";

// ── Job / task configuration ───────────────────────────────────────

/// Identity of a job: who owns it, where it runs, what it's called.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobKey {
    pub role: String,
    pub environment: String,
    pub name: String,
}

impl JobKey {
    pub fn new(role: &str, environment: &str, name: &str) -> Self {
        Self {
            role: role.to_string(),
            environment: environment.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.role, self.environment, self.name)
    }
}

/// A placement constraint on a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    /// Host attribute name the constraint applies to.
    pub name: String,
    pub predicate: ConstraintPredicate,
}

/// The two constraint forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintPredicate {
    /// The host attribute must (or, negated, must not) carry one of `values`.
    Value {
        negated: bool,
        values: BTreeSet<String>,
    },
    /// At most `limit` active tasks of the same job may share one value of
    /// the attribute.
    Limit { limit: u32 },
}

impl Constraint {
    /// A non-negated value constraint.
    pub fn value(name: &str, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.to_string(),
            predicate: ConstraintPredicate::Value {
                negated: false,
                values: values.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// A limit constraint.
    pub fn limit(name: &str, limit: u32) -> Self {
        Self {
            name: name.to_string(),
            predicate: ConstraintPredicate::Limit { limit },
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self.predicate, ConstraintPredicate::Value { .. })
    }
}

/// Scheduling-relevant configuration of a task.
///
/// Two tasks with equal configs are interchangeable for placement purposes;
/// `TaskGroupKey` relies on that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub job: JobKey,
    /// Numeric priority; higher preempts lower within a role.
    pub priority: i32,
    pub production: bool,
    /// Named scheduling tier; resolved through `TierManager`.
    pub tier: Option<String>,
    pub resources: ResourceSlot,
    pub constraints: Vec<Constraint>,
}

impl Eq for TaskConfig {}

impl Hash for TaskConfig {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.job.hash(state);
        self.priority.hash(state);
        self.production.hash(state);
        self.tier.hash(state);
        self.resources.hash(state);
        self.constraints.hash(state);
    }
}

impl TaskConfig {
    /// Whether the task declares a dedicated-host constraint.
    pub fn is_dedicated(&self) -> bool {
        self.constraints.iter().any(|c| c.name == DEDICATED_ATTRIBUTE)
    }

    /// The values of the task's dedicated constraint, if it has one.
    pub fn dedicated_values(&self) -> Option<&BTreeSet<String>> {
        self.constraints
            .iter()
            .find(|c| c.name == DEDICATED_ATTRIBUTE)
            .and_then(|c| match &c.predicate {
                ConstraintPredicate::Value { values, .. } => Some(values),
                ConstraintPredicate::Limit { .. } => None,
            })
    }
}

/// Equivalence-class key for pending tasks: job identity plus full config
/// equality. All tasks sharing a key schedule identically.
#[derive(Debug, Clone)]
pub struct TaskGroupKey(Arc<TaskConfig>);

impl TaskGroupKey {
    pub fn from_config(config: Arc<TaskConfig>) -> Self {
        Self(config)
    }

    pub fn config(&self) -> &TaskConfig {
        &self.0
    }
}

impl PartialEq for TaskGroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for TaskGroupKey {}

impl Hash for TaskGroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for TaskGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.job)
    }
}

// ── Host attributes ────────────────────────────────────────────────

/// Host maintenance mode, in ascending order of scheduling avoidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceMode {
    None,
    Scheduled,
    Draining,
    Drained,
}

impl MaintenanceMode {
    /// Rank used when ordering offers: active hosts first, drained last.
    pub fn preference_rank(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for MaintenanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MaintenanceMode::None => "none",
            MaintenanceMode::Scheduled => "scheduled",
            MaintenanceMode::Draining => "draining",
            MaintenanceMode::Drained => "drained",
        };
        f.write_str(s)
    }
}

/// A named host attribute with its value set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub values: BTreeSet<String>,
}

impl Attribute {
    pub fn new(name: &str, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// The attribute ground truth for one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostAttributes {
    pub host: String,
    pub mode: MaintenanceMode,
    pub attributes: Vec<Attribute>,
}

impl HostAttributes {
    pub fn new(host: &str, mode: MaintenanceMode) -> Self {
        Self {
            host: host.to_string(),
            mode,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }
}

// ── Offers ─────────────────────────────────────────────────────────

/// Identity of a single resource offer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OfferId(pub String);

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OfferId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identity of a host as known to the resource manager.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HostId(pub String);

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HostId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A time-bounded lease of a host's spare resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostOffer {
    pub id: OfferId,
    pub host_id: HostId,
    pub hostname: String,
    pub resources: ResourceSlot,
    pub attributes: HostAttributes,
}
