//! Futures that suspend a task on a reactor registration.
//!
//! [`TimerWait`] waits on an absolute deadline and reports whether it expired or
//! was aborted. [`Readiness`] waits until a non-blocking descriptor can make
//! progress. Both deregister themselves when dropped before completion.

use crate::reactor::core::Handle;
use crate::reactor::event::{Interest, Token};
use crate::reactor::timers::{TimerId, WaitOutcome};

use std::future::Future;
use std::io;
use std::os::fd::RawFd;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Cancelable wait on a deadline of the reactor's timer queue.
///
/// Registered as soon as it is created, so it can be aborted before its first poll.
pub(crate) struct TimerWait {
    handle: Handle,
    id: TimerId,
    done: bool,
}

impl TimerWait {
    pub(crate) fn new(handle: Handle, id: TimerId) -> Self {
        Self {
            handle,
            id,
            done: false,
        }
    }

    pub(crate) fn id(&self) -> TimerId {
        self.id
    }
}

impl Future for TimerWait {
    type Output = WaitOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let outcome = this.handle.poll_wait(this.id, cx.waker());
        if outcome.is_ready() {
            this.done = true;
        }

        outcome
    }
}

impl Drop for TimerWait {
    fn drop(&mut self) {
        if !self.done {
            self.handle.remove_wait(self.id);
        }
    }
}

/// Future that resolves once a descriptor is ready for the requested direction.
///
/// Created by [`Handle::readable`] and [`Handle::writable`]. The first poll
/// registers interest; the future resolves after the reactor reports readiness.
/// Resolving does not guarantee the next syscall succeeds: callers retry on
/// `WouldBlock` and wait again.
///
/// # Examples
///
/// ```no_run
/// use cofiber::Handle;
/// use std::os::fd::RawFd;
///
/// # async fn wait(handle: Handle, fd: RawFd) -> std::io::Result<()> {
/// handle.readable(fd).await?;
/// # Ok(())
/// # }
/// ```
pub struct Readiness {
    handle: Handle,
    fd: RawFd,
    interest: Interest,
    token: Option<Token>,
}

impl Readiness {
    pub(crate) fn new(handle: Handle, fd: RawFd, interest: Interest) -> Self {
        Self {
            handle,
            fd,
            interest,
            token: None,
        }
    }
}

impl Future for Readiness {
    type Output = io::Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.fd < 0 {
            return Poll::Ready(Err(io::Error::from_raw_os_error(libc::EBADF)));
        }

        // Our entry is gone: the poller reported readiness (or another waiter
        // replaced it, which callers handle like any spurious readiness).
        if let Some(token) = this.token
            && !this.handle.is_registered(this.fd, this.interest, token)
        {
            this.token = None;
            return Poll::Ready(Ok(()));
        }

        let token = this
            .handle
            .register_interest(this.fd, this.interest, this.token, cx.waker());
        this.token = Some(token);

        Poll::Pending
    }
}

impl Drop for Readiness {
    fn drop(&mut self) {
        if let Some(token) = self.token {
            self.handle.deregister_interest(self.fd, self.interest, token);
        }
    }
}
