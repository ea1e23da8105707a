//! Scheduler subsystem: ready queue, task wakers and scheduling policies.

pub(crate) mod policy;
pub(crate) mod queue;
pub(crate) mod waker;
pub mod yield_now;

pub use policy::{RoundRobin, SchedulingPolicy};
pub(crate) use queue::ReadyQueue;
pub(crate) use waker::{TaskWaker, make_waker};
pub use yield_now::{YieldNow, yield_now};
