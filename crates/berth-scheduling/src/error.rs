//! Scheduling configuration errors.

use thiserror::Error;

/// Errors from constructing scheduling components.
#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SchedulingResult<T> = Result<T, SchedulingError>;
