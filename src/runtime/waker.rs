//! Waker implementation for task wake-up notifications.
//!
//! A task waker carries only the task id and the reactor's injector queue, which
//! keeps it `Send + Sync` even though the task itself lives in single-threaded
//! reactor state. Implements the waking protocol with `RawWaker` and
//! `RawWakerVTable`.

use crate::runtime::ReadyQueue;
use crate::task::TaskId;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{RawWaker, RawWakerVTable, Waker};

/// Re-queues its task when woken.
///
/// A task is queued at most once per suspension: `scheduled` stays set until the
/// reactor is about to poll the task again.
pub(crate) struct TaskWaker {
    task: TaskId,
    queue: Arc<ReadyQueue>,
    scheduled: AtomicBool,
}

impl TaskWaker {
    pub(crate) fn new(task: TaskId, queue: Arc<ReadyQueue>) -> Arc<Self> {
        Arc::new(Self {
            task,
            queue,
            scheduled: AtomicBool::new(false),
        })
    }

    /// Pushes the task to the ready queue unless it is already there.
    pub(crate) fn schedule(&self) {
        if !self.scheduled.swap(true, Ordering::AcqRel) {
            self.queue.push(self.task);
        }
    }

    /// Called right before the task is polled, so wakes during the poll queue it again.
    pub(crate) fn unschedule(&self) {
        self.scheduled.store(false, Ordering::Release);
    }

    fn clone_raw(ptr: *const ()) -> RawWaker {
        // SAFETY: `ptr` was produced by `Arc::into_raw` in `make_waker` or `clone_raw`.
        unsafe { Arc::increment_strong_count(ptr as *const TaskWaker) };
        RawWaker::new(ptr, &Self::VTABLE)
    }

    fn wake_raw(ptr: *const ()) {
        // SAFETY: takes back the reference owned by the waker being consumed.
        let waker = unsafe { Arc::from_raw(ptr as *const TaskWaker) };
        waker.schedule();
    }

    fn wake_by_ref_raw(ptr: *const ()) {
        // SAFETY: the waker still owns its reference; we only borrow it.
        let waker = unsafe { &*(ptr as *const TaskWaker) };
        waker.schedule();
    }

    fn drop_raw(ptr: *const ()) {
        // SAFETY: releases the reference owned by the dropped waker.
        unsafe { drop(Arc::from_raw(ptr as *const TaskWaker)) };
    }

    const VTABLE: RawWakerVTable = RawWakerVTable::new(
        Self::clone_raw,
        Self::wake_raw,
        Self::wake_by_ref_raw,
        Self::drop_raw,
    );
}

/// Creates a `Waker` that schedules the task behind `waker`.
pub(crate) fn make_waker(waker: Arc<TaskWaker>) -> Waker {
    let raw = RawWaker::new(Arc::into_raw(waker) as *const (), &TaskWaker::VTABLE);

    // SAFETY: the vtable functions uphold the `Arc` reference counting contract.
    unsafe { Waker::from_raw(raw) }
}
