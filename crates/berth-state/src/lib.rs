//! Domain types shared by every Berth component.
//!
//! These types describe the scheduling-relevant view of the world: what a
//! task needs (`TaskConfig`, `Constraint`), what a host looks like
//! (`HostAttributes`, `MaintenanceMode`), what the resource manager has
//! leased us (`HostOffer`), and how tasks map to scheduling tiers
//! (`TierManager`). All types are serializable to JSON.

pub mod stores;
pub mod tiers;
pub mod types;

pub use stores::{AttributeStore, StaticAttributeStore};
pub use tiers::{TierConfig, TierConfigError, TierInfo, TierManager};
pub use types::{
    Attribute, Constraint, ConstraintPredicate, HostAttributes, HostId, HostOffer, JobKey,
    MaintenanceMode, OfferId, TaskConfig, TaskGroupKey, DEDICATED_ATTRIBUTE,
};
