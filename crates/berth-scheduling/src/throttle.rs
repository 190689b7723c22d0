//! Aggregate scheduling throughput limiter.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{SchedulingError, SchedulingResult};

/// Hands out permits at a fixed rate, shared across every group loop.
/// Acquisition blocks the calling task until its permit slot arrives; slots
/// are reserved under a lock but waited on outside it.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(permits_per_second: f64) -> SchedulingResult<Self> {
        if !permits_per_second.is_finite() || permits_per_second <= 0.0 {
            return Err(SchedulingError::InvalidConfig(
                "rate limiter permits per second must be positive".to_string(),
            ));
        }
        Ok(Self {
            interval: Duration::from_secs_f64(1.0 / permits_per_second),
            next_slot: Mutex::new(None),
        })
    }

    /// Waits for the next permit.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().unwrap();
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.interval);
            slot
        };
        tokio::time::sleep_until(slot).await;
    }
}
