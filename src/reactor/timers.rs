//! Timer queue of the reactor.
//!
//! Waits are registered once with their absolute deadline and completed
//! explicitly, either when the reactor sees the deadline pass or when the wait is
//! aborted. Completed waits keep their outcome until the waiting future collects it.

use std::collections::{BTreeSet, HashMap};
use std::task::{Poll, Waker};
use std::time::Instant;

/// Identifier of a registered timer wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TimerId(u64);

/// How a timer wait completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The reactor observed the deadline.
    Expired,
    /// The wait was canceled before its deadline.
    Aborted,
}

struct TimerEntry {
    deadline: Instant,
    waker: Option<Waker>,
    outcome: Option<WaitOutcome>,
}

pub(crate) struct TimerQueue {
    // Ordered by deadline, then by registration order for equal deadlines.
    pending: BTreeSet<(Instant, TimerId)>,
    entries: HashMap<TimerId, TimerEntry>,
    next_id: u64,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self {
            pending: BTreeSet::new(),
            entries: HashMap::new(),
            next_id: 0,
        }
    }

    pub(crate) fn insert(&mut self, deadline: Instant) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        self.pending.insert((deadline, id));
        self.entries.insert(
            id,
            TimerEntry {
                deadline,
                waker: None,
                outcome: None,
            },
        );

        id
    }

    /// Returns the outcome once the wait completed, removing the entry.
    ///
    /// While pending, stores `waker` so the completion can wake the caller.
    pub(crate) fn poll_wait(&mut self, id: TimerId, waker: &Waker) -> Poll<WaitOutcome> {
        let Some(entry) = self.entries.get_mut(&id) else {
            // Unknown ids were already collected or removed; treat as aborted.
            return Poll::Ready(WaitOutcome::Aborted);
        };

        if let Some(outcome) = entry.outcome {
            self.entries.remove(&id);
            return Poll::Ready(outcome);
        }

        let stale = entry
            .waker
            .as_ref()
            .is_none_or(|current| !current.will_wake(waker));

        if stale {
            entry.waker = Some(waker.clone());
        }

        Poll::Pending
    }

    /// Completes a pending wait with [`WaitOutcome::Aborted`].
    ///
    /// Returns the waker to call. Waits that already completed are left untouched.
    pub(crate) fn abort(&mut self, id: TimerId) -> Option<Waker> {
        let entry = self.entries.get_mut(&id)?;

        if entry.outcome.is_some() {
            return None;
        }

        self.pending.remove(&(entry.deadline, id));
        entry.outcome = Some(WaitOutcome::Aborted);

        entry.waker.take()
    }

    /// Forgets a wait whose future was dropped.
    pub(crate) fn remove(&mut self, id: TimerId) {
        if let Some(entry) = self.entries.remove(&id) {
            self.pending.remove(&(entry.deadline, id));
        }
    }

    /// Completes every wait whose deadline is at or before `now`, in deadline order.
    ///
    /// Returns the wakers to call.
    pub(crate) fn fire_expired(&mut self, now: Instant) -> Vec<Waker> {
        let mut wakers = Vec::new();

        while let Some(&(deadline, id)) = self.pending.first() {
            if deadline > now {
                break;
            }

            self.pending.pop_first();

            if let Some(entry) = self.entries.get_mut(&id) {
                entry.outcome = Some(WaitOutcome::Expired);
                wakers.extend(entry.waker.take());
            }
        }

        wakers
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.pending.first().map(|(deadline, _)| *deadline)
    }

    /// Number of waits that have not completed yet.
    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures::task::noop_waker;
    use std::time::Duration;

    #[test]
    fn fires_in_deadline_order() {
        let mut timers = TimerQueue::new();
        let start = Instant::now();
        let waker = noop_waker();

        let late = timers.insert(start + Duration::from_millis(20));
        let early = timers.insert(start + Duration::from_millis(10));
        let _ = timers.poll_wait(late, &waker);
        let _ = timers.poll_wait(early, &waker);

        assert_eq!(timers.next_deadline(), Some(start + Duration::from_millis(10)));

        assert_eq!(timers.fire_expired(start + Duration::from_millis(15)).len(), 1);
        assert_eq!(timers.poll_wait(early, &waker), Poll::Ready(WaitOutcome::Expired));
        assert_eq!(timers.poll_wait(late, &waker), Poll::Pending);
        assert_eq!(timers.pending(), 1);

        assert_eq!(timers.fire_expired(start + Duration::from_millis(20)).len(), 1);
        assert_eq!(timers.poll_wait(late, &waker), Poll::Ready(WaitOutcome::Expired));
        assert_eq!(timers.next_deadline(), None);
    }

    #[test]
    fn abort_completes_pending_wait_only_once() {
        let mut timers = TimerQueue::new();
        let start = Instant::now();
        let waker = noop_waker();

        let id = timers.insert(start + Duration::from_secs(1));
        let _ = timers.poll_wait(id, &waker);

        assert!(timers.abort(id).is_some());
        assert!(timers.abort(id).is_none());
        assert_eq!(timers.pending(), 0);

        // An aborted wait never expires afterwards.
        assert!(timers.fire_expired(start + Duration::from_secs(2)).is_empty());
        assert_eq!(timers.poll_wait(id, &waker), Poll::Ready(WaitOutcome::Aborted));
    }

    #[test]
    fn abort_after_expiry_keeps_expired() {
        let mut timers = TimerQueue::new();
        let start = Instant::now();
        let waker = noop_waker();

        let id = timers.insert(start);
        timers.fire_expired(start);

        assert!(timers.abort(id).is_none());
        assert_eq!(timers.poll_wait(id, &waker), Poll::Ready(WaitOutcome::Expired));
    }

    #[test]
    fn removed_wait_leaves_no_deadline() {
        let mut timers = TimerQueue::new();
        let id = timers.insert(Instant::now());

        timers.remove(id);

        assert_eq!(timers.pending(), 0);
        assert_eq!(timers.next_deadline(), None);
    }
}
