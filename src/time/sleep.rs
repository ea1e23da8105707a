use crate::reactor::Handle;
use crate::reactor::future::TimerWait;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// A future that completes once the reactor's clock reaches a deadline.
///
/// Created by [`sleep`], [`Handle::sleep`] or [`Handle::sleep_until`]. The timer
/// is registered with the reactor on the first poll, then the task stays
/// suspended until the reactor reports the deadline, so there is no busy polling.
pub struct Sleep {
    handle: Handle,
    deadline: Instant,
    wait: Option<TimerWait>,
}

impl Sleep {
    pub(crate) fn new(handle: Handle, deadline: Instant) -> Self {
        Self {
            handle,
            deadline,
            wait: None,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl fmt::Debug for Sleep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sleep")
            .field("deadline", &self.deadline)
            .field("registered", &self.wait.is_some())
            .finish()
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.handle.now() >= this.deadline {
            this.wait = None;
            return Poll::Ready(());
        }

        let handle = &this.handle;
        let deadline = this.deadline;
        let wait = this.wait.get_or_insert_with(|| handle.wait_until(deadline));

        // Nothing else can abort a sleep's wait, so any completion means expiry.
        match Pin::new(wait).poll(cx) {
            Poll::Ready(_) => {
                this.wait = None;
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Sleeps for `duration` on the reactor behind `handle`.
///
/// # Example
///
/// ```
/// use cofiber::{ManualClock, Reactor, time::sleep};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let mut reactor = Reactor::builder().clock(clock.clone()).build();
/// let handle = reactor.handle();
///
/// reactor
///     .block_on(async move { sleep(&handle, Duration::from_millis(100)).await })
///     .unwrap();
///
/// assert_eq!(clock.elapsed(), Duration::from_millis(100));
/// ```
pub fn sleep(handle: &Handle, duration: Duration) -> Sleep {
    handle.sleep(duration)
}

/// Sleeps until the reactor's clock reaches `deadline`.
pub fn sleep_until(handle: &Handle, deadline: Instant) -> Sleep {
    handle.sleep_until(deadline)
}
