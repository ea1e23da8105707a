//! Time sources for the reactor.
//!
//! The reactor never calls `Instant::now()` directly. Every deadline is computed
//! from the [`Clock`] it was built with, which lets tests run against a
//! [`ManualClock`] that jumps straight to the next deadline instead of sleeping.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

// Roughly thirty years.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Latest representable instant at most `FAR_FUTURE` after `now`.
pub(crate) fn far_future(now: Instant) -> Instant {
    let mut span = FAR_FUTURE;

    while !span.is_zero() {
        if let Some(deadline) = now.checked_add(span) {
            return deadline;
        }
        span /= 2;
    }

    now
}

/// A monotonic source of `now` used for every deadline computed by the reactor.
pub trait Clock {
    /// Current point in time.
    fn now(&self) -> Instant;

    /// Called when nothing is runnable and `deadline` is the earliest pending timer.
    ///
    /// Returns how long the reactor may block in the poller. A real clock lets the
    /// poller sleep for the remaining time; a simulated clock moves itself to
    /// `deadline` and returns zero.
    fn idle_until(&self, deadline: Instant) -> Duration;
}

/// Wall-clock time from [`Instant::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn idle_until(&self, deadline: Instant) -> Duration {
        deadline.saturating_duration_since(Instant::now())
    }
}

/// Simulated clock advanced explicitly or by the idle reactor.
///
/// Clones share the same time, so a test can keep one clone and hand another to
/// [`ReactorBuilder::clock`](crate::ReactorBuilder::clock).
#[derive(Clone)]
pub struct ManualClock {
    origin: Instant,
    current: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        let origin = Instant::now();

        Self {
            origin,
            current: Rc::new(Cell::new(origin)),
        }
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.current.get() - self.origin
    }

    /// Moves the clock forward.
    pub fn advance(&self, duration: Duration) {
        self.current.set(self.current.get() + duration);
    }

    /// Moves the clock backwards, never before its origin.
    ///
    /// Simulates a clock adjustment, which is how a wait can appear to complete
    /// before its deadline.
    pub fn rewind(&self, duration: Duration) {
        let target = self
            .current
            .get()
            .checked_sub(duration)
            .unwrap_or(self.origin)
            .max(self.origin);

        self.current.set(target);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock")
            .field("elapsed", &self.elapsed())
            .finish()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.current.get()
    }

    fn idle_until(&self, deadline: Instant) -> Duration {
        if deadline > self.current.get() {
            self.current.set(deadline);
        }

        Duration::ZERO
    }
}
