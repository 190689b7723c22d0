//! Offer lifecycle management.
//!
//! The `OfferManager` tracks every resource offer the scheduler currently
//! holds. Offers arrive from the cluster resource manager, live in a
//! multiply-indexed store for the duration of a configurable return delay,
//! and leave by being launched against, cancelled, declined back for
//! compaction, or expiring.
//!
//! # Components
//!
//! - **`manager`** — `OfferManager`, the `OfferDriver` integration trait,
//!   and offer settings
//! - **`index`** — the internal mutex-guarded offer store
//! - **`error`** — launch failure taxonomy

pub mod error;
mod index;
pub mod manager;

pub use error::{LaunchError, LaunchResult};
pub use manager::{OfferDriver, OfferManager, OfferSettings, TaskLaunch};
