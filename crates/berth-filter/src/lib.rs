//! Veto-based admission filtering.
//!
//! `SchedulingFilter` is the single admission oracle for the scheduler: the
//! offer-matching loop uses it to test candidate offers, and the preemptor
//! re-uses it to test accumulated victim resources. It is a pure function
//! over its inputs and safe to call concurrently.
//!
//! # Components
//!
//! - **`veto`** — typed, scored rejection reasons
//! - **`aggregate`** — job-level attribute aggregate for limit constraints
//! - **`matcher`** — value/limit constraint evaluation against one host
//! - **`filter`** — the tiered filter implementation

pub mod aggregate;
pub mod filter;
pub mod matcher;
pub mod veto;

pub use aggregate::AttributeAggregate;
pub use filter::{ResourceRequest, SchedulingFilter, StandardSchedulingFilter, UnusedResource};
pub use veto::{Veto, VetoKind, MAX_SCORE};
