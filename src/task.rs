//! Cooperative tasks and their join handles.
//!
//! A task is a boxed future stored in the reactor's task table. It runs until it
//! returns `Poll::Pending` at an await point (timer wait, I/O readiness,
//! [`yield_now`](crate::yield_now)) and is polled again once its waker re-queues
//! it.
//!
//! # Join Handles
//!
//! [`Handle::spawn`](crate::Handle::spawn) returns a [`JoinHandle`] that can be
//! awaited, or joined through [`JoinHandle::join`], to get the task's output:
//!
//! ```
//! use cofiber::Reactor;
//!
//! let mut reactor = Reactor::new();
//! let handle = reactor.handle();
//!
//! let answer = reactor
//!     .block_on(async move {
//!         let mut task = handle.spawn(async { 42 });
//!         task.join().await
//!     })
//!     .unwrap();
//!
//! assert_eq!(answer.unwrap(), 42);
//! ```
//!
//! # How Tasks Work
//!
//! 1. The future is boxed and inserted in the reactor's task table
//! 2. Its id is pushed to the ready queue
//! 3. The reactor polls it with a waker bound to that id
//! 4. When the future returns `Poll::Pending`, it is stored back in the table
//! 5. When a timer fires or a descriptor becomes ready, the waker re-queues the id
//! 6. The task is polled again in the next batch

use crate::error::{Error, Result};
use crate::runtime::TaskWaker;

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

/// Identifier of a task inside its reactor.
///
/// Slots of the task table are reused, so an id pairs the slot with the spawn
/// sequence number. A waker outliving its task carries an id that no longer
/// matches the slot and is ignored by the reactor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    key: usize,
    seq: u64,
}

impl TaskId {
    pub(crate) fn new(key: usize, seq: u64) -> Self {
        Self { key, seq }
    }

    /// Slot of the task table.
    pub(crate) fn key(self) -> usize {
        self.key
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.seq)
    }
}

/// Entry of the reactor's task table.
///
/// The future is taken out while it is being polled so the table is not borrowed
/// during the poll; a task spawned from inside another task can then be inserted.
pub(crate) struct Task {
    pub(crate) id: TaskId,
    pub(crate) future: Option<Pin<Box<dyn Future<Output = ()>>>>,
    pub(crate) waker: Arc<TaskWaker>,
}

impl Task {
    pub(crate) fn new(
        id: TaskId,
        future: Pin<Box<dyn Future<Output = ()>>>,
        waker: Arc<TaskWaker>,
    ) -> Self {
        Self {
            id,
            future: Some(future),
            waker,
        }
    }
}

struct JoinState<T> {
    output: Option<T>,
    finished: bool,
    waiter: Option<Waker>,
}

/// Write side of a join: stores the output and wakes the joiner.
pub(crate) struct Completion<T> {
    state: Rc<RefCell<JoinState<T>>>,
}

impl<T> Completion<T> {
    pub(crate) fn complete(self, output: T) {
        let waiter = {
            let mut state = self.state.borrow_mut();
            state.output = Some(output);
            state.finished = true;
            state.waiter.take()
        };

        if let Some(waiter) = waiter {
            waiter.wake();
        }
    }
}

/// Owned permission to wait for a spawned task and take its output.
///
/// Dropping the handle detaches the task; it keeps running to completion.
pub struct JoinHandle<T> {
    id: TaskId,
    state: Rc<RefCell<JoinState<T>>>,
    joined: bool,
}

impl<T> JoinHandle<T> {
    pub(crate) fn new(id: TaskId) -> (Self, Completion<T>) {
        let state = Rc::new(RefCell::new(JoinState {
            output: None,
            finished: false,
            waiter: None,
        }));

        let handle = Self {
            id,
            state: state.clone(),
            joined: false,
        };

        (handle, Completion { state })
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Whether the task has run to completion.
    pub fn is_finished(&self) -> bool {
        self.state.borrow().finished
    }

    /// Whether the handle has not been joined yet.
    pub fn joinable(&self) -> bool {
        !self.joined
    }

    /// Waits for the task to finish and takes its output.
    ///
    /// Suspends the calling task until the joined task is done. A second join
    /// resolves to [`Error::AlreadyJoined`].
    pub fn join(&mut self) -> Join<'_, T> {
        Join { handle: self }
    }

    fn poll_join(&mut self, cx: &mut Context<'_>) -> Poll<Result<T>> {
        if self.joined {
            return Poll::Ready(Err(Error::AlreadyJoined));
        }

        let mut state = self.state.borrow_mut();

        if state.finished {
            self.joined = true;
            return Poll::Ready(state.output.take().ok_or(Error::AlreadyJoined));
        }

        state.waiter = Some(cx.waker().clone());

        Poll::Pending
    }
}

impl<T> fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinHandle")
            .field("id", &self.id)
            .field("finished", &self.is_finished())
            .field("joined", &self.joined)
            .finish()
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().poll_join(cx)
    }
}

/// Future returned by [`JoinHandle::join`].
pub struct Join<'a, T> {
    handle: &'a mut JoinHandle<T>,
}

impl<T> Future for Join<'_, T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().handle.poll_join(cx)
    }
}
