//! Single-threaded reactor with cooperative tasks and a cancelable one-shot timer.
//!
//! Tasks are futures scheduled by the reactor that owns them. They look like
//! blocking code: a task awaiting a deadline, a descriptor or another task is
//! suspended and resumed once the reactor posts the completion.
//!
//! # Architecture
//!
//! - **Reactor**: event loop owning the timer queue, the `poll(2)` registry, the
//!   ready queue and the task table
//! - **Handle**: cloneable, explicit access to a reactor from inside tasks
//! - **SchedulingPolicy**: ready-task ordering chosen at construction
//!   ([`RoundRobin`] by default)
//! - **Clock**: source of time, real ([`SystemClock`]) or simulated ([`ManualClock`])
//! - **Timer**: one-shot timer racing its deadline against cancellation
//! - **ReactorBuilder**: fluent construction of all of the above
//! - **demo**: the timer-against-busy-task run driven by the `cofiber` binary
//!
//! # Example
//!
//! ```
//! use cofiber::{Reactor, Timer, TimerState};
//! use std::time::Duration;
//!
//! let (builder, clock) = Reactor::builder().simulated();
//! let mut reactor = builder.build();
//! let handle = reactor.handle();
//!
//! let outcome = reactor
//!     .block_on(async move {
//!         let timer = Timer::start(&handle, Duration::from_millis(1000), || {}).await;
//!
//!         handle.sleep(Duration::from_millis(500)).await;
//!         timer.cancel();
//!
//!         timer.close().await
//!     })
//!     .unwrap();
//!
//! assert_eq!(outcome, TimerState::Canceled);
//! assert_eq!(clock.elapsed(), Duration::from_millis(500));
//! ```

mod builder;
mod error;
mod reactor;
mod runtime;
mod task;
mod timer;
mod utils;

pub mod demo;
pub mod time;

pub use builder::ReactorBuilder;
pub use error::{Error, Result};
pub use reactor::{Handle, Interest, Reactor, Readiness, WaitOutcome, set_nonblocking};
pub use runtime::{RoundRobin, SchedulingPolicy, YieldNow, yield_now};
pub use task::{Join, JoinHandle, TaskId};
pub use time::{Clock, ManualClock, SystemClock};
pub use timer::{Timer, TimerState};
