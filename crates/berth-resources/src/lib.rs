//! Berth resource accounting — aggregate resource vectors and the
//! partial order used to rank preemption victims.
//!
//! # Components
//!
//! - **`slot`** — `ResourceSlot` arithmetic (add, subtract, max, sum) and
//!   the component-wise dominance comparator
//! - **`dimension`** — named resource dimensions and the configurable
//!   scaling ranges used when scoring insufficient-resource vetoes

pub mod dimension;
pub mod slot;

pub use dimension::{ResourceKind, ScalingRanges};
pub use slot::{ResourceSlot, BYTES_PER_MB};
