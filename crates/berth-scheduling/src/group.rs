//! A single task group's queue and penalty state.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use berth_state::TaskGroupKey;

struct GroupInner {
    queue: VecDeque<String>,
    penalty: Duration,
}

/// FIFO queue of pending task ids sharing one scheduling configuration,
/// plus the group's current penalty. Queue and penalty mutate under the
/// group's own lock; liveness decisions additionally hold the group-map
/// lock in `TaskGroups`.
pub struct TaskGroup {
    key: TaskGroupKey,
    inner: Mutex<GroupInner>,
}

impl TaskGroup {
    pub fn new(key: TaskGroupKey, initial_task_id: String) -> Self {
        Self {
            key,
            inner: Mutex::new(GroupInner {
                queue: VecDeque::from([initial_task_id]),
                penalty: Duration::ZERO,
            }),
        }
    }

    pub fn key(&self) -> &TaskGroupKey {
        &self.key
    }

    /// Enqueues a task id. A task already queued is left in place.
    pub fn offer(&self, task_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.queue.iter().any(|id| id == task_id) {
            inner.queue.push_back(task_id.to_string());
        }
    }

    /// The oldest queued task id, if any.
    pub fn peek(&self) -> Option<String> {
        self.inner.lock().unwrap().queue.front().cloned()
    }

    /// Removes a task id from the queue, wherever it sits. Idempotent.
    pub fn remove(&self, task_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.queue.retain(|id| id != task_id);
    }

    pub fn has_more(&self) -> bool {
        !self.inner.lock().unwrap().queue.is_empty()
    }

    pub fn penalty(&self) -> Duration {
        self.inner.lock().unwrap().penalty
    }

    pub fn set_penalty(&self, penalty: Duration) {
        self.inner.lock().unwrap().penalty = penalty;
    }

    /// Snapshot of the queued ids, oldest first.
    pub fn queued_task_ids(&self) -> Vec<String> {
        self.inner.lock().unwrap().queue.iter().cloned().collect()
    }
}
