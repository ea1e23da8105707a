//! Fluent builder for [`Reactor`] construction.
//!
//! The clock and the scheduling policy are chosen here, once per reactor.

use crate::reactor::Reactor;
use crate::runtime::{RoundRobin, SchedulingPolicy};
use crate::time::{Clock, ManualClock, SystemClock};

use std::rc::Rc;

const DEFAULT_CAPACITY: usize = 64;

/// Builder for [`Reactor`] instances.
///
/// # Example
/// ```
/// use cofiber::{ManualClock, ReactorBuilder, RoundRobin};
///
/// let clock = ManualClock::new();
/// let reactor = ReactorBuilder::new()
///     .clock(clock.clone())
///     .policy(RoundRobin::new())
///     .capacity(16)
///     .build();
/// # drop(reactor);
/// ```
pub struct ReactorBuilder {
    clock: Rc<dyn Clock>,
    policy: Box<dyn SchedulingPolicy>,
    capacity: usize,
}

impl Default for ReactorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReactorBuilder {
    /// System clock, round-robin scheduling.
    pub fn new() -> Self {
        Self {
            clock: Rc::new(SystemClock),
            policy: Box::new(RoundRobin::new()),
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Uses `clock` for every deadline computed by the reactor.
    pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Rc::new(clock);
        self
    }

    /// Uses a fresh [`ManualClock`], returned alongside the builder so the caller
    /// can read or move it.
    pub fn simulated(self) -> (Self, ManualClock) {
        let clock = ManualClock::new();
        (self.clock(clock.clone()), clock)
    }

    /// Scheduling policy of the reactor's ready tasks.
    pub fn policy<P: SchedulingPolicy + 'static>(mut self, policy: P) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Initial capacity of the task table and the readiness registry.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn build(self) -> Reactor {
        log::trace!("building reactor (capacity: {})", self.capacity);
        Reactor::from_parts(self.clock, self.policy, self.capacity)
    }
}
