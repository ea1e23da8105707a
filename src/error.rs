//! Error type shared by the reactor, the scheduler and the time utilities.

use std::io;

use thiserror::Error;

/// Errors surfaced by the runtime.
///
/// A canceled timer is not an error: cancellation is a normal terminal state of
/// [`Timer`](crate::Timer).
#[derive(Debug, Error)]
pub enum Error {
    /// The readiness poller failed.
    #[error("reactor I/O failure: {0}")]
    Io(#[from] io::Error),

    /// The reactor was stopped before the awaited future completed.
    #[error("reactor was stopped")]
    Stopped,

    /// No task, timer or I/O registration is left that could complete the future.
    #[error("reactor ran out of work while the future was still pending")]
    Idle,

    /// The task output was already taken by a previous join.
    #[error("task was already joined")]
    AlreadyJoined,

    /// The deadline of a [`timeout`](crate::time::timeout) elapsed first.
    #[error("deadline has elapsed")]
    Elapsed,
}

pub type Result<T> = std::result::Result<T, Error>;
