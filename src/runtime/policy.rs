//! Scheduling policies.
//!
//! A policy decides which ready task runs next. It is handed to the reactor at
//! construction through [`ReactorBuilder::policy`](crate::ReactorBuilder::policy),
//! so every reactor carries its own and nothing is installed process-wide.

use crate::task::TaskId;

use std::collections::VecDeque;

/// Ordering of ready tasks inside the reactor.
pub trait SchedulingPolicy {
    /// A task became runnable.
    fn awakened(&mut self, task: TaskId);

    /// Next task to poll, if any.
    fn pick_next(&mut self) -> Option<TaskId>;

    /// Number of tasks currently waiting for their turn.
    fn ready_count(&self) -> usize;

    fn has_ready(&self) -> bool {
        self.ready_count() > 0
    }
}

/// Runs ready tasks in the order they became ready.
///
/// A task that yields is re-queued behind every task already waiting, which gives
/// each runnable task one turn per rotation.
#[derive(Debug, Default)]
pub struct RoundRobin {
    ready: VecDeque<TaskId>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchedulingPolicy for RoundRobin {
    fn awakened(&mut self, task: TaskId) {
        self.ready.push_back(task);
    }

    fn pick_next(&mut self) -> Option<TaskId> {
        self.ready.pop_front()
    }

    fn ready_count(&self) -> usize {
        self.ready.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_is_fifo() {
        let mut policy = RoundRobin::new();
        assert!(!policy.has_ready());

        policy.awakened(TaskId::new(2, 2));
        policy.awakened(TaskId::new(0, 0));
        assert_eq!(policy.ready_count(), 2);

        assert_eq!(policy.pick_next(), Some(TaskId::new(2, 2)));
        policy.awakened(TaskId::new(2, 2));
        assert_eq!(policy.pick_next(), Some(TaskId::new(0, 0)));
        assert_eq!(policy.pick_next(), Some(TaskId::new(2, 2)));
        assert_eq!(policy.pick_next(), None);
    }
}
