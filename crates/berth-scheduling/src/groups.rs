//! The task group map and per-group attempt loops.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use berth_metrics::{DurationStats, MetricsRegistry};
use berth_state::{TaskConfig, TaskGroupKey};

use crate::backoff::BackoffStrategy;
use crate::error::{SchedulingError, SchedulingResult};
use crate::group::TaskGroup;
use crate::throttle::RateLimiter;

const SCHEDULED_TASK_PENALTY: &str = "scheduled_task_penalty";

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// The task-scheduling entry point driven by the group loops. Returns
/// whether the attempt placed the task; no other signal crosses this
/// boundary.
pub trait TaskScheduler: Send + Sync {
    fn schedule(&self, task_id: &str) -> BoxFuture<bool>;
}

/// Computes the initial penalty for a task that is being rescheduled rather
/// than placed for the first time.
pub trait RescheduleCalculator: Send + Sync {
    fn startup_delay(&self, task: &PendingTask) -> Duration;
}

/// Reschedule calculator applying one flat delay to every rescheduled task.
#[derive(Debug, Clone)]
pub struct FlatRescheduleCalculator {
    pub delay: Duration,
}

impl RescheduleCalculator for FlatRescheduleCalculator {
    fn startup_delay(&self, _task: &PendingTask) -> Duration {
        self.delay
    }
}

/// A task that has entered the pending state.
#[derive(Debug, Clone)]
pub struct PendingTask {
    pub task_id: String,
    pub config: Arc<TaskConfig>,
    /// Whether this is the task's first placement, as opposed to a
    /// reschedule of a task that ran before.
    pub first_time: bool,
}

impl PendingTask {
    pub fn group_key(&self) -> TaskGroupKey {
        TaskGroupKey::from_config(self.config.clone())
    }
}

/// Task groups configuration.
pub struct TaskGroupsSettings {
    /// Delay before a group's first attempt, and the reset penalty after a
    /// success that leaves the queue non-empty.
    pub first_schedule_delay: Duration,
    pub backoff: Arc<dyn BackoffStrategy>,
    /// Bounds aggregate attempt throughput across all groups.
    pub rate_limiter: Arc<RateLimiter>,
}

/// Partitions pending tasks into equivalence classes and runs one attempt
/// loop per class.
///
/// Cloning is cheap and yields a handle to the same state; group loops run
/// as tokio tasks, so `TaskGroups` must be created inside a runtime.
#[derive(Clone)]
pub struct TaskGroups {
    inner: Arc<GroupsInner>,
}

struct GroupsInner {
    groups: Mutex<HashMap<TaskGroupKey, Arc<TaskGroup>>>,
    settings: TaskGroupsSettings,
    scheduler: Arc<dyn TaskScheduler>,
    reschedule: Arc<dyn RescheduleCalculator>,
    /// Realized penalties of successful attempts, for backoff tuning.
    penalties: DurationStats,
}

impl TaskGroups {
    pub fn new(
        settings: TaskGroupsSettings,
        scheduler: Arc<dyn TaskScheduler>,
        reschedule: Arc<dyn RescheduleCalculator>,
        metrics: &MetricsRegistry,
    ) -> SchedulingResult<Self> {
        if settings.first_schedule_delay.is_zero() {
            return Err(SchedulingError::InvalidConfig(
                "first schedule delay must be positive".to_string(),
            ));
        }
        Ok(Self {
            inner: Arc::new(GroupsInner {
                groups: Mutex::new(HashMap::new()),
                settings,
                scheduler,
                reschedule,
                penalties: metrics.duration_stats(SCHEDULED_TASK_PENALTY),
            }),
        })
    }

    /// Routes a newly pending task to its group, creating the group and
    /// starting its attempt loop if this is the first task of its class.
    pub fn task_pending(&self, task: &PendingTask) {
        let key = task.group_key();
        let mut groups = self.inner.groups.lock().unwrap();
        match groups.entry(key.clone()) {
            Entry::Occupied(entry) => entry.get().offer(&task.task_id),
            Entry::Vacant(entry) => {
                let group = Arc::new(TaskGroup::new(key, task.task_id.clone()));
                let penalty = if task.first_time {
                    self.inner.settings.first_schedule_delay
                } else {
                    self.inner.reschedule.startup_delay(task)
                };
                group.set_penalty(penalty);
                entry.insert(group.clone());
                spawn_group(self.inner.clone(), group);
            }
        }
    }

    /// Cancels future attempts for deleted tasks by removing them from
    /// their groups' queues. Safe to call for tasks that were never
    /// pending or whose group is already gone.
    pub fn tasks_deleted<I>(&self, tasks: I)
    where
        I: IntoIterator<Item = (String, Arc<TaskConfig>)>,
    {
        let groups = self.inner.groups.lock().unwrap();
        for (task_id, config) in tasks {
            let key = TaskGroupKey::from_config(config);
            if let Some(group) = groups.get(&key) {
                group.remove(&task_id);
            }
        }
    }

    /// Snapshot of the live groups.
    pub fn groups(&self) -> Vec<Arc<TaskGroup>> {
        self.inner.groups.lock().unwrap().values().cloned().collect()
    }
}

/// Runs one group's attempt loop until its queue drains.
fn spawn_group(inner: Arc<GroupsInner>, group: Arc<TaskGroup>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(group.penalty()).await;

            let mut next_penalty = Duration::ZERO;
            if let Some(task_id) = group.peek() {
                inner.settings.rate_limiter.acquire().await;
                if inner.scheduler.schedule(&task_id).await {
                    inner.penalties.accumulate(group.penalty());
                    group.remove(&task_id);
                    if group.has_more() {
                        // Later arrivals must not inherit this task's
                        // accumulated backoff.
                        next_penalty = inner.settings.first_schedule_delay;
                    }
                } else {
                    next_penalty = inner.settings.backoff.backoff(group.penalty());
                    debug!(group = %group.key(), penalty_ms = next_penalty.as_millis() as u64,
                        "schedule attempt failed, backing off");
                }
            }
            group.set_penalty(next_penalty);

            // Liveness decision under the map lock: a task offered to this
            // group concurrently either lands before the emptiness check or
            // finds the group already unmapped and creates a fresh one.
            let keep = {
                let mut groups = inner.groups.lock().unwrap();
                if group.has_more() {
                    true
                } else {
                    groups.remove(group.key());
                    false
                }
            };
            if !keep {
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use tokio::time::Instant;

    use berth_resources::ResourceSlot;
    use berth_state::JobKey;

    use crate::backoff::TruncatedBinaryBackoff;

    /// Scheduler double: pops scripted outcomes (defaulting to success) and
    /// records each call with its timestamp.
    struct FakeScheduler {
        outcomes: Mutex<VecDeque<bool>>,
        calls: Mutex<Vec<(String, Instant)>>,
    }

    impl FakeScheduler {
        fn new(outcomes: impl IntoIterator<Item = bool>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into_iter().collect()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, Instant)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl TaskScheduler for FakeScheduler {
        fn schedule(&self, task_id: &str) -> BoxFuture<bool> {
            let outcome = self.outcomes.lock().unwrap().pop_front().unwrap_or(true);
            self.calls
                .lock()
                .unwrap()
                .push((task_id.to_string(), Instant::now()));
            Box::pin(async move { outcome })
        }
    }

    fn make_config(priority: i32) -> Arc<TaskConfig> {
        Arc::new(TaskConfig {
            job: JobKey::new("web", "prod", "api"),
            priority,
            production: false,
            tier: None,
            resources: ResourceSlot::from_mb(1.0, 512, 0, 0),
            constraints: Vec::new(),
        })
    }

    fn make_pending(task_id: &str, config: Arc<TaskConfig>) -> PendingTask {
        PendingTask {
            task_id: task_id.to_string(),
            config,
            first_time: true,
        }
    }

    fn make_groups(
        scheduler: Arc<FakeScheduler>,
        metrics: &MetricsRegistry,
    ) -> TaskGroups {
        let settings = TaskGroupsSettings {
            first_schedule_delay: Duration::from_secs(1),
            backoff: Arc::new(
                TruncatedBinaryBackoff::new(Duration::from_secs(2), Duration::from_secs(8))
                    .unwrap(),
            ),
            rate_limiter: Arc::new(RateLimiter::new(1000.0).unwrap()),
        };
        TaskGroups::new(
            settings,
            scheduler,
            Arc::new(FlatRescheduleCalculator {
                delay: Duration::from_secs(5),
            }),
            metrics,
        )
        .unwrap()
    }

    async fn settle() {
        // Let spawned group loops run through their timers.
        tokio::time::sleep(Duration::from_secs(60)).await;
    }

    #[test]
    fn zero_first_delay_is_rejected() {
        let settings = TaskGroupsSettings {
            first_schedule_delay: Duration::ZERO,
            backoff: Arc::new(
                TruncatedBinaryBackoff::new(Duration::from_secs(1), Duration::from_secs(2))
                    .unwrap(),
            ),
            rate_limiter: Arc::new(RateLimiter::new(1.0).unwrap()),
        };
        let result = TaskGroups::new(
            settings,
            FakeScheduler::new([]),
            Arc::new(FlatRescheduleCalculator {
                delay: Duration::from_secs(1),
            }),
            &MetricsRegistry::new(),
        );
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn first_attempt_happens_after_first_delay() {
        let scheduler = FakeScheduler::new([true]);
        let metrics = MetricsRegistry::new();
        let groups = make_groups(scheduler.clone(), &metrics);

        let start = Instant::now();
        groups.task_pending(&make_pending("t1", make_config(0)));
        settle().await;

        let calls = scheduler.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "t1");
        assert_eq!(calls[0].1 - start, Duration::from_secs(1));
        // Queue drained, group gone.
        assert!(groups.groups().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduled_task_uses_calculator_delay() {
        let scheduler = FakeScheduler::new([true]);
        let metrics = MetricsRegistry::new();
        let groups = make_groups(scheduler.clone(), &metrics);

        let start = Instant::now();
        groups.task_pending(&PendingTask {
            task_id: "t1".to_string(),
            config: make_config(0),
            first_time: false,
        });
        settle().await;

        let calls = scheduler.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1 - start, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_back_off_exponentially() {
        let scheduler = FakeScheduler::new([false, false, true]);
        let metrics = MetricsRegistry::new();
        let groups = make_groups(scheduler.clone(), &metrics);

        let start = Instant::now();
        groups.task_pending(&make_pending("t1", make_config(0)));
        settle().await;

        let calls = scheduler.calls();
        assert_eq!(calls.len(), 3);
        // Attempts at 1s, then +backoff(1s)=2s, then +backoff(2s)=4s.
        assert_eq!(calls[0].1 - start, Duration::from_secs(1));
        assert_eq!(calls[1].1 - start, Duration::from_secs(3));
        assert_eq!(calls[2].1 - start, Duration::from_secs(7));
        assert!(groups.groups().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_penalty_for_remaining_tasks() {
        let scheduler = FakeScheduler::new([false, false, true, true]);
        let metrics = MetricsRegistry::new();
        let groups = make_groups(scheduler.clone(), &metrics);

        let config = make_config(0);
        groups.task_pending(&make_pending("t1", config.clone()));
        groups.task_pending(&make_pending("t2", config));
        settle().await;

        let calls = scheduler.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[2].0, "t1");
        assert_eq!(calls[3].0, "t2");
        // After t1 succeeds at 7s with t2 still queued, the next attempt
        // comes after the first-schedule delay, not after backoff(4s).
        assert_eq!(calls[3].1 - calls[2].1, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn tasks_in_one_group_schedule_fifo() {
        let scheduler = FakeScheduler::new([]);
        let metrics = MetricsRegistry::new();
        let groups = make_groups(scheduler.clone(), &metrics);

        let config = make_config(0);
        groups.task_pending(&make_pending("t1", config.clone()));
        groups.task_pending(&make_pending("t2", config.clone()));
        groups.task_pending(&make_pending("t3", config));
        settle().await;

        let order: Vec<_> = scheduler.calls().into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec!["t1", "t2", "t3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn different_configs_get_independent_groups() {
        let scheduler = FakeScheduler::new([]);
        let metrics = MetricsRegistry::new();
        let groups = make_groups(scheduler.clone(), &metrics);

        groups.task_pending(&make_pending("t1", make_config(1)));
        groups.task_pending(&make_pending("t2", make_config(2)));

        assert_eq!(groups.groups().len(), 2);
        settle().await;
        assert_eq!(scheduler.calls().len(), 2);
        assert!(groups.groups().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn deleted_task_is_never_attempted() {
        let scheduler = FakeScheduler::new([]);
        let metrics = MetricsRegistry::new();
        let groups = make_groups(scheduler.clone(), &metrics);

        let config = make_config(0);
        groups.task_pending(&make_pending("t1", config.clone()));
        groups.tasks_deleted([("t1".to_string(), config)]);
        settle().await;

        assert!(scheduler.calls().is_empty());
        assert!(groups.groups().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_unknown_task_is_noop() {
        let scheduler = FakeScheduler::new([]);
        let metrics = MetricsRegistry::new();
        let groups = make_groups(scheduler.clone(), &metrics);

        groups.tasks_deleted([("ghost".to_string(), make_config(0))]);
        settle().await;
        assert!(scheduler.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn enqueue_to_live_group_while_backing_off() {
        let scheduler = FakeScheduler::new([false, true, true]);
        let metrics = MetricsRegistry::new();
        let groups = make_groups(scheduler.clone(), &metrics);

        let config = make_config(0);
        groups.task_pending(&make_pending("t1", config.clone()));

        // Land t2 in the existing group while t1 is still backing off.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(groups.groups().len(), 1);
        groups.task_pending(&make_pending("t2", config));
        settle().await;

        let order: Vec<_> = scheduler.calls().into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec!["t1", "t1", "t2"]);
        assert!(groups.groups().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn successful_attempts_record_penalties() {
        let scheduler = FakeScheduler::new([true]);
        let metrics = MetricsRegistry::new();
        let groups = make_groups(scheduler.clone(), &metrics);

        groups.task_pending(&make_pending("t1", make_config(0)));
        settle().await;

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot["scheduled_task_penalty_events"], 1);
        assert_eq!(snapshot["scheduled_task_penalty_ms"], 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limiter_spaces_attempts_across_groups() {
        let scheduler = FakeScheduler::new([]);
        let metrics = MetricsRegistry::new();
        let settings = TaskGroupsSettings {
            first_schedule_delay: Duration::from_millis(10),
            backoff: Arc::new(
                TruncatedBinaryBackoff::new(Duration::from_secs(1), Duration::from_secs(8))
                    .unwrap(),
            ),
            // One attempt per second across the whole scheduler.
            rate_limiter: Arc::new(RateLimiter::new(1.0).unwrap()),
        };
        let groups = TaskGroups::new(
            settings,
            scheduler.clone(),
            Arc::new(FlatRescheduleCalculator {
                delay: Duration::from_secs(1),
            }),
            &metrics,
        )
        .unwrap();

        groups.task_pending(&make_pending("t1", make_config(1)));
        groups.task_pending(&make_pending("t2", make_config(2)));
        settle().await;

        let mut times: Vec<_> = scheduler.calls().into_iter().map(|(_, at)| at).collect();
        times.sort();
        assert_eq!(times.len(), 2);
        assert!(times[1] - times[0] >= Duration::from_secs(1));
    }
}
