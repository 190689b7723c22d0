//! Penalty growth strategies.

use std::time::Duration;

use crate::error::{SchedulingError, SchedulingResult};

/// Computes the next penalty from the previous one after a failed attempt.
pub trait BackoffStrategy: Send + Sync {
    fn backoff(&self, previous: Duration) -> Duration;
}

/// Doubles the previous penalty, truncated at a maximum. A zero previous
/// penalty starts at the initial value.
#[derive(Debug, Clone)]
pub struct TruncatedBinaryBackoff {
    initial: Duration,
    max: Duration,
}

impl TruncatedBinaryBackoff {
    pub fn new(initial: Duration, max: Duration) -> SchedulingResult<Self> {
        if initial.is_zero() {
            return Err(SchedulingError::InvalidConfig(
                "initial backoff must be positive".to_string(),
            ));
        }
        if max < initial {
            return Err(SchedulingError::InvalidConfig(
                "maximum backoff must be at least the initial backoff".to_string(),
            ));
        }
        Ok(Self { initial, max })
    }
}

impl BackoffStrategy for TruncatedBinaryBackoff {
    fn backoff(&self, previous: Duration) -> Duration {
        if previous.is_zero() {
            self.initial
        } else {
            (previous * 2).min(self.max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_until_truncated() {
        let backoff =
            TruncatedBinaryBackoff::new(Duration::from_secs(1), Duration::from_secs(8)).unwrap();

        assert_eq!(backoff.backoff(Duration::ZERO), Duration::from_secs(1));
        assert_eq!(backoff.backoff(Duration::from_secs(1)), Duration::from_secs(2));
        assert_eq!(backoff.backoff(Duration::from_secs(2)), Duration::from_secs(4));
        assert_eq!(backoff.backoff(Duration::from_secs(8)), Duration::from_secs(8));
        assert_eq!(backoff.backoff(Duration::from_secs(100)), Duration::from_secs(8));
    }

    #[test]
    fn rejects_zero_initial() {
        assert!(TruncatedBinaryBackoff::new(Duration::ZERO, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn rejects_max_below_initial() {
        assert!(
            TruncatedBinaryBackoff::new(Duration::from_secs(5), Duration::from_secs(1)).is_err()
        );
    }
}
