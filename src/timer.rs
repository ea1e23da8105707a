//! Cancelable one-shot timer.
//!
//! A [`Timer`] owns one task that waits on the reactor's timer queue and runs a
//! callback when the deadline is reached. The timer goes through exactly one
//! transition:
//!
//! ```text
//! Waiting ──cancel() / aborted wait──▶ Canceled
//!    │
//!    └──────deadline reached─────────▶ Fired   (callback runs once)
//! ```
//!
//! A fired or canceled timer cannot be re-armed; build a new one instead.
//!
//! # Example
//!
//! ```
//! use cofiber::{ManualClock, Reactor, Timer, TimerState};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let mut reactor = Reactor::builder().clock(clock.clone()).build();
//! let handle = reactor.handle();
//!
//! let stopper = handle.clone();
//! let timer = Timer::spawn(&handle, Duration::from_millis(1000), move || stopper.stop());
//!
//! reactor.run().unwrap();
//!
//! assert_eq!(timer.state(), TimerState::Fired);
//! assert_eq!(clock.elapsed(), Duration::from_millis(1000));
//! ```

use crate::reactor::Handle;
use crate::reactor::WaitOutcome;
use crate::reactor::timers::TimerId;
use crate::runtime::yield_now;
use crate::task::JoinHandle;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Lifecycle of a [`Timer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    Waiting,
    Canceled,
    Fired,
}

impl TimerState {
    pub fn is_terminal(self) -> bool {
        self != TimerState::Waiting
    }
}

// State shared between the timer and its task.
struct TimerShared {
    state: Cell<TimerState>,
    wait: Cell<Option<TimerId>>,
}

/// One-shot timer that runs a callback once its deadline is reached, unless canceled.
pub struct Timer {
    handle: Handle,
    shared: Rc<TimerShared>,
    task: JoinHandle<()>,
    deadline: Instant,
}

impl Timer {
    /// Starts a timer and yields once, so its task has registered the wait when
    /// this returns.
    ///
    /// Use from inside a task. Code running outside the reactor uses [`Timer::spawn`].
    pub async fn start<F>(handle: &Handle, duration: Duration, callback: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        let timer = Self::spawn(handle, duration, callback);
        yield_now().await;
        timer
    }

    /// Starts a timer without yielding.
    ///
    /// The deadline is fixed now; the wait is registered when the task first runs.
    /// `Duration::MAX` is accepted and means a deadline that is never reached in
    /// practice.
    pub fn spawn<F>(handle: &Handle, duration: Duration, callback: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        let deadline = handle.deadline_after(duration);
        let shared = Rc::new(TimerShared {
            state: Cell::new(TimerState::Waiting),
            wait: Cell::new(None),
        });

        let task = handle.spawn(wait_and_fire(
            handle.clone(),
            shared.clone(),
            deadline,
            callback,
        ));

        log::debug!("timer {} armed for {duration:?}", task.id());

        Self {
            handle: handle.clone(),
            shared,
            task,
            deadline,
        }
    }

    /// Cancels a waiting timer.
    ///
    /// The pending wait is aborted so the timer's task wakes up and finishes
    /// without running the callback. Returns `false` if the timer already fired or
    /// was canceled.
    pub fn cancel(&self) -> bool {
        if self.shared.state.get().is_terminal() {
            return false;
        }

        self.shared.state.set(TimerState::Canceled);

        if let Some(wait) = self.shared.wait.take() {
            self.handle.abort_wait(wait);
        }

        log::debug!("timer {} canceled", self.task.id());

        true
    }

    pub fn state(&self) -> TimerState {
        self.shared.state.get()
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Whether the timer's task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the timer's task to finish and returns the terminal state.
    ///
    /// Other tasks keep running while this waits. Without a cancel this waits
    /// until the deadline.
    pub async fn close(mut self) -> TimerState {
        if self.task.joinable() {
            // The task never returns an error value; the join only fails if
            // already joined, which `joinable` excludes.
            let _ = self.task.join().await;
        }

        self.state()
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("state", &self.state())
            .field("deadline", &self.deadline)
            .field("task", &self.task)
            .finish()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            log::trace!("timer {} dropped before close, task runs detached", self.task.id());
        }
    }
}

async fn wait_and_fire<F>(handle: Handle, shared: Rc<TimerShared>, deadline: Instant, callback: F)
where
    F: FnOnce(),
{
    loop {
        if shared.state.get() == TimerState::Canceled {
            return;
        }

        let wait = handle.wait_until(deadline);
        shared.wait.set(Some(wait.id()));

        let outcome = wait.await;
        shared.wait.set(None);

        if shared.state.get() == TimerState::Canceled || outcome == WaitOutcome::Aborted {
            shared.state.set(TimerState::Canceled);
            return;
        }

        let now = handle.now();
        if now >= deadline {
            shared.state.set(TimerState::Fired);
            log::debug!("timer fired");
            callback();
            return;
        }

        log::warn!(
            "timer woke {:?} before its deadline, re-arming",
            deadline - now
        );
    }
}
