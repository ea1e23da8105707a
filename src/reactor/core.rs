//! Single-threaded reactor driving cooperative tasks.
//!
//! The reactor owns everything a task can wait on: the timer queue, the readiness
//! registry and the ready queue. Tasks reach it through an explicit [`Handle`];
//! there is no thread-local "current reactor".
//!
//! One iteration of the loop is a *turn*:
//!
//! 1. drain the ids woken since the last turn into the scheduling policy
//! 2. poll exactly that many tasks (a batch); tasks woken during the batch wait
//!    for the next turn
//! 3. collect timer expirations and I/O readiness, idling on the clock first when
//!    nothing is runnable
//!
//! [`Handle::stop`] is observed between batches.

use crate::builder::ReactorBuilder;
use crate::error::{Error, Result};
use crate::reactor::event::{Interest, Registry, Token};
use crate::reactor::future::{Readiness, TimerWait};
use crate::reactor::timers::{TimerId, TimerQueue, WaitOutcome};
use crate::runtime::{ReadyQueue, SchedulingPolicy, TaskWaker, make_waker};
use crate::task::{JoinHandle, Task, TaskId};
use crate::time::{Clock, Sleep, far_future};
use crate::utils::slab::Slab;

use futures::task::{ArcWake, waker};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::os::fd::RawFd;
use std::pin::pin;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

pub(crate) struct Shared {
    clock: Rc<dyn Clock>,
    ready: Arc<ReadyQueue>,
    policy: RefCell<Box<dyn SchedulingPolicy>>,
    tasks: RefCell<Slab<Task>>,
    timers: RefCell<TimerQueue>,
    registry: RefCell<Registry>,
    stopped: Cell<bool>,
    spawned: Cell<u64>,
}

/// Cloneable access to a reactor from inside its tasks.
///
/// Every operation that needs the reactor (spawning, sleeping, waiting for I/O,
/// stopping) goes through a handle, which is passed explicitly to the code that
/// needs it.
#[derive(Clone)]
pub struct Handle {
    shared: Rc<Shared>,
}

impl Handle {
    /// Spawns a task, queued behind the tasks that are already runnable.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let mut tasks = self.shared.tasks.borrow_mut();
        let seq = self.shared.spawned.get();
        self.shared.spawned.set(seq.wrapping_add(1));
        let id = TaskId::new(tasks.vacant_key(), seq);

        let (handle, completion) = JoinHandle::new(id);
        let future = Box::pin(async move {
            completion.complete(future.await);
        });

        let task_waker = TaskWaker::new(id, self.shared.ready.clone());
        task_waker.schedule();
        tasks.insert(Task::new(id, future, task_waker));

        log::trace!("spawned {id}");

        handle
    }

    /// Current time of the reactor's clock.
    pub fn now(&self) -> Instant {
        self.shared.clock.now()
    }

    /// Waits until `duration` has passed on the reactor's clock.
    ///
    /// Durations too large to be represented, such as `Duration::MAX`, sleep until
    /// a far-future deadline.
    pub fn sleep(&self, duration: Duration) -> Sleep {
        Sleep::new(self.clone(), self.deadline_after(duration))
    }

    /// Waits until the reactor's clock reaches `deadline`.
    pub fn sleep_until(&self, deadline: Instant) -> Sleep {
        Sleep::new(self.clone(), deadline)
    }

    /// Waits until `fd` is readable (or reports an error or hang-up).
    pub fn readable(&self, fd: RawFd) -> Readiness {
        Readiness::new(self.clone(), fd, Interest::Readable)
    }

    /// Waits until `fd` is writable (or reports an error or hang-up).
    pub fn writable(&self, fd: RawFd) -> Readiness {
        Readiness::new(self.clone(), fd, Interest::Writable)
    }

    /// Asks the running loop to return after the current batch.
    ///
    /// Idempotent. The reactor stays stopped until [`Reactor::restart`].
    pub fn stop(&self) {
        if !self.shared.stopped.replace(true) {
            log::debug!("reactor stop requested");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.get()
    }

    /// Number of spawned tasks that have not finished.
    pub fn task_count(&self) -> usize {
        self.shared.tasks.borrow().len()
    }

    /// Number of timer waits that have not completed.
    pub fn pending_timers(&self) -> usize {
        self.shared.timers.borrow().pending()
    }

    /// `now + duration`, saturated at a far-future instant instead of overflowing.
    pub(crate) fn deadline_after(&self, duration: Duration) -> Instant {
        let now = self.now();
        now.checked_add(duration).unwrap_or_else(|| far_future(now))
    }

    pub(crate) fn wait_until(&self, deadline: Instant) -> TimerWait {
        let id = self.shared.timers.borrow_mut().insert(deadline);
        TimerWait::new(self.clone(), id)
    }

    pub(crate) fn poll_wait(&self, id: TimerId, waker: &Waker) -> Poll<WaitOutcome> {
        self.shared.timers.borrow_mut().poll_wait(id, waker)
    }

    /// Completes a pending timer wait as aborted and wakes its task.
    pub(crate) fn abort_wait(&self, id: TimerId) {
        let waker = self.shared.timers.borrow_mut().abort(id);

        if let Some(waker) = waker {
            waker.wake();
        }
    }

    pub(crate) fn remove_wait(&self, id: TimerId) {
        self.shared.timers.borrow_mut().remove(id);
    }

    pub(crate) fn register_interest(
        &self,
        fd: RawFd,
        interest: Interest,
        token: Option<Token>,
        waker: &Waker,
    ) -> Token {
        self.shared
            .registry
            .borrow_mut()
            .register(fd, interest, token, waker)
    }

    pub(crate) fn deregister_interest(&self, fd: RawFd, interest: Interest, token: Token) {
        self.shared
            .registry
            .borrow_mut()
            .deregister(fd, interest, token);
    }

    pub(crate) fn is_registered(&self, fd: RawFd, interest: Interest, token: Token) -> bool {
        self.shared
            .registry
            .borrow()
            .is_registered(fd, interest, token)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("tasks", &self.task_count())
            .field("pending_timers", &self.pending_timers())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// The event loop.
///
/// # Example
///
/// ```
/// use cofiber::{ManualClock, Reactor};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let mut reactor = Reactor::builder().clock(clock.clone()).build();
/// let handle = reactor.handle();
///
/// reactor.spawn({
///     let handle = handle.clone();
///     async move {
///         handle.sleep(Duration::from_millis(100)).await;
///         handle.stop();
///     }
/// });
///
/// reactor.run().unwrap();
/// assert_eq!(clock.elapsed(), Duration::from_millis(100));
/// ```
pub struct Reactor {
    handle: Handle,
}

impl Reactor {
    /// Reactor with the system clock and round-robin scheduling.
    pub fn new() -> Self {
        ReactorBuilder::new().build()
    }

    pub fn builder() -> ReactorBuilder {
        ReactorBuilder::new()
    }

    pub(crate) fn from_parts(
        clock: Rc<dyn Clock>,
        policy: Box<dyn SchedulingPolicy>,
        capacity: usize,
    ) -> Self {
        let shared = Shared {
            clock,
            ready: Arc::new(ReadyQueue::new()),
            policy: RefCell::new(policy),
            tasks: RefCell::new(Slab::with_capacity(capacity)),
            timers: RefCell::new(TimerQueue::new()),
            registry: RefCell::new(Registry::with_capacity(capacity)),
            stopped: Cell::new(false),
            spawned: Cell::new(0),
        };

        Self {
            handle: Handle {
                shared: Rc::new(shared),
            },
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// See [`Handle::spawn`].
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        self.handle.spawn(future)
    }

    pub fn now(&self) -> Instant {
        self.handle.now()
    }

    /// See [`Handle::stop`].
    pub fn stop(&self) {
        self.handle.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.handle.is_stopped()
    }

    /// Clears the stopped flag so the loop can run again.
    pub fn restart(&self) {
        self.handle.shared.stopped.set(false);
    }

    /// Runs tasks and dispatches completions until stopped or out of work.
    ///
    /// Returns immediately when the reactor is already stopped. Out of work means
    /// no runnable task, no pending timer and no I/O registration.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] when the readiness poller fails.
    pub fn run(&mut self) -> Result<()> {
        log::debug!("reactor running");

        while !self.is_stopped() {
            self.run_batch();

            if self.is_stopped() || !self.park()? {
                break;
            }
        }

        log::debug!(
            "reactor left its loop (stopped: {}, tasks: {})",
            self.is_stopped(),
            self.handle.task_count()
        );

        Ok(())
    }

    /// One turn: a batch of ready tasks, then completions that are already due.
    ///
    /// Never idles, so a simulated clock only moves when the caller moves it.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] when the readiness poller fails.
    pub fn turn(&mut self) -> Result<()> {
        self.run_batch();
        self.collect(Some(Duration::ZERO))
    }

    /// Drives the reactor until `future` completes.
    ///
    /// The future itself is not a task: it is polled by the loop whenever it is
    /// woken, while spawned tasks keep running around it.
    ///
    /// # Errors
    ///
    /// - [`Error::Stopped`] if the reactor is stopped before the future completes
    /// - [`Error::Idle`] if nothing is left that could wake the future
    /// - [`Error::Io`] when the readiness poller fails
    pub fn block_on<F: Future>(&mut self, future: F) -> Result<F::Output> {
        let mut future = pin!(future);

        let notified = Arc::new(Notified(AtomicBool::new(true)));
        let waker = waker(notified.clone());
        let mut cx = Context::from_waker(&waker);

        loop {
            if notified.take()
                && let Poll::Ready(output) = future.as_mut().poll(&mut cx)
            {
                return Ok(output);
            }

            if self.is_stopped() {
                return Err(Error::Stopped);
            }

            self.run_batch();

            if notified.is_set() {
                self.collect(Some(Duration::ZERO))?;
                continue;
            }

            if self.is_stopped() {
                return Err(Error::Stopped);
            }

            if !self.park()? && !notified.is_set() {
                return Err(Error::Idle);
            }
        }
    }

    fn run_batch(&self) {
        let shared = &self.handle.shared;

        let batch = {
            let mut policy = shared.policy.borrow_mut();
            for id in shared.ready.drain() {
                policy.awakened(id);
            }
            policy.ready_count()
        };

        for _ in 0..batch {
            let next = shared.policy.borrow_mut().pick_next();
            match next {
                Some(id) => self.poll_task(id),
                None => break,
            }
        }
    }

    fn poll_task(&self, id: TaskId) {
        let shared = &self.handle.shared;

        let (mut future, task_waker) = {
            let mut tasks = shared.tasks.borrow_mut();
            let Some(task) = tasks.get_mut(id.key()) else {
                return;
            };
            // A waker that outlived its task, its slot now holds another one.
            if task.id != id {
                log::trace!("ignoring stale wake of {id}");
                return;
            }
            let Some(future) = task.future.take() else {
                return;
            };
            (future, task.waker.clone())
        };

        task_waker.unschedule();
        let waker = make_waker(task_waker);
        let mut cx = Context::from_waker(&waker);

        match future.as_mut().poll(&mut cx) {
            Poll::Pending => {
                if let Some(task) = shared.tasks.borrow_mut().get_mut(id.key()) {
                    task.future = Some(future);
                }
            }
            Poll::Ready(()) => {
                drop(future);
                let finished = shared.tasks.borrow_mut().remove(id.key());
                drop(finished);
                log::trace!("{id} finished");
            }
        }
    }

    /// Collects completions, idling on the clock when nothing is runnable.
    ///
    /// Returns `false` when there is no work left at all.
    fn park(&self) -> Result<bool> {
        let shared = &self.handle.shared;

        let runnable = !shared.ready.is_empty() || shared.policy.borrow().has_ready();
        if runnable {
            self.collect(Some(Duration::ZERO))?;
            return Ok(true);
        }

        let next_deadline = shared.timers.borrow().next_deadline();
        let has_io = !shared.registry.borrow().is_empty();

        let timeout = match next_deadline {
            Some(deadline) => Some(shared.clock.idle_until(deadline)),
            None if has_io => None,
            None => return Ok(false),
        };

        self.collect(timeout)?;

        Ok(true)
    }

    fn collect(&self, timeout: Option<Duration>) -> Result<()> {
        let shared = &self.handle.shared;

        let mut wakers = shared.registry.borrow_mut().poll(timeout)?;
        wakers.extend(shared.timers.borrow_mut().fire_expired(shared.clock.now()));

        for waker in wakers {
            waker.wake();
        }

        Ok(())
    }
}

impl Default for Reactor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Reactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactor").field("handle", &self.handle).finish()
    }
}

impl Drop for Reactor {
    // Tasks hold handles to the reactor; dropping them breaks the cycle.
    fn drop(&mut self) {
        let tasks = self.handle.shared.tasks.borrow_mut().drain();
        if !tasks.is_empty() {
            log::debug!("dropping {} unfinished task(s)", tasks.len());
        }
        drop(tasks);
    }
}

/// Wake flag of the future passed to [`Reactor::block_on`].
struct Notified(AtomicBool);

impl Notified {
    fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl ArcWake for Notified {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.0.store(true, Ordering::Release);
    }
}
