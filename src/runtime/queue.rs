//! Injector queue fed by task wakers.
//!
//! Wakers must be `Send + Sync`, so this is the only piece of scheduler state
//! behind a mutex. The reactor drains it at the start of every batch and hands
//! the ids to its [`SchedulingPolicy`](crate::runtime::SchedulingPolicy).

use crate::task::TaskId;

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// FIFO of task ids that were woken since the last batch.
pub(crate) struct ReadyQueue {
    queue: Mutex<VecDeque<TaskId>>,
}

impl ReadyQueue {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn push(&self, task: TaskId) {
        self.lock().push_back(task);
    }

    /// Takes every queued id, in wake order.
    pub(crate) fn drain(&self) -> Vec<TaskId> {
        self.lock().drain(..).collect()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the deque half-updated.
    fn lock(&self) -> MutexGuard<'_, VecDeque<TaskId>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
