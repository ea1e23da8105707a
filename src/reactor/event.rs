//! Readiness registry built on `poll(2)`.
//!
//! Registrations are one-shot: once a descriptor is reported ready the entry is
//! removed and its waker returned, and the woken future registers again if it
//! needs to wait once more.

use libc::{POLLERR, POLLHUP, POLLIN, POLLNVAL, POLLOUT, c_int, nfds_t, pollfd};
use std::collections::HashMap;
use std::io;
use std::os::fd::RawFd;
use std::task::Waker;
use std::time::Duration;

/// Direction of readiness a future waits for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interest {
    Readable,
    Writable,
}

impl Interest {
    fn events(self) -> i16 {
        match self {
            Interest::Readable => POLLIN,
            Interest::Writable => POLLOUT,
        }
    }

    // Errors and hang-ups wake both directions so the next syscall reports them.
    fn is_ready(self, revents: i16) -> bool {
        revents & (self.events() | POLLERR | POLLHUP | POLLNVAL) != 0
    }
}

/// Token identifying one registration, so a waiter only ever touches its own entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Token(u64);

struct Registration {
    token: Token,
    waker: Waker,
}

pub(crate) struct Registry {
    interests: HashMap<(RawFd, Interest), Registration>,
    fds: Vec<pollfd>,
    next_token: u64,
}

impl Registry {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            interests: HashMap::with_capacity(capacity),
            fds: Vec::with_capacity(capacity),
            next_token: 0,
        }
    }

    /// Registers interest in `fd`, or refreshes the waker of registration `token`.
    ///
    /// A new registration replaces any other waiter on the same `(fd, interest)`.
    pub(crate) fn register(
        &mut self,
        fd: RawFd,
        interest: Interest,
        token: Option<Token>,
        waker: &Waker,
    ) -> Token {
        if let Some(current) = self.interests.get_mut(&(fd, interest))
            && Some(current.token) == token
        {
            if !current.waker.will_wake(waker) {
                current.waker = waker.clone();
            }
            return current.token;
        }

        let token = Token(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);

        self.interests.insert(
            (fd, interest),
            Registration {
                token,
                waker: waker.clone(),
            },
        );

        token
    }

    /// Removes registration `token`; a newer registration on the same pair is kept.
    pub(crate) fn deregister(&mut self, fd: RawFd, interest: Interest, token: Token) {
        if self.is_registered(fd, interest, token) {
            self.interests.remove(&(fd, interest));
        }
    }

    pub(crate) fn is_registered(&self, fd: RawFd, interest: Interest, token: Token) -> bool {
        self.interests
            .get(&(fd, interest))
            .is_some_and(|current| current.token == token)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.interests.is_empty()
    }

    /// Waits up to `timeout` (forever when `None`) for readiness.
    ///
    /// Returns the wakers of every registration that became ready. With nothing
    /// registered this only sleeps for the timeout.
    pub(crate) fn poll(&mut self, timeout: Option<Duration>) -> io::Result<Vec<Waker>> {
        if self.interests.is_empty() && timeout == Some(Duration::ZERO) {
            return Ok(Vec::new());
        }

        self.fds.clear();
        for &(fd, interest) in self.interests.keys() {
            match self.fds.iter_mut().find(|entry| entry.fd == fd) {
                Some(entry) => entry.events |= interest.events(),
                None => self.fds.push(pollfd {
                    fd,
                    events: interest.events(),
                    revents: 0,
                }),
            }
        }

        let n_events = unsafe {
            libc::poll(
                self.fds.as_mut_ptr(),
                self.fds.len() as nfds_t,
                timeout_ms(timeout),
            )
        };

        if n_events < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(Vec::new());
            }

            return Err(err);
        }

        let mut wakers = Vec::new();

        for entry in self.fds.iter().filter(|entry| entry.revents != 0) {
            for interest in [Interest::Readable, Interest::Writable] {
                if !interest.is_ready(entry.revents) {
                    continue;
                }

                if let Some(registration) = self.interests.remove(&(entry.fd, interest)) {
                    wakers.push(registration.waker);
                }
            }
        }

        Ok(wakers)
    }
}

// Rounds up so a sub-millisecond remainder does not turn into a busy loop.
fn timeout_ms(timeout: Option<Duration>) -> c_int {
    match timeout {
        None => -1,
        Some(duration) => {
            let mut ms = duration.as_millis();
            if duration.subsec_nanos() % 1_000_000 != 0 {
                ms += 1;
            }

            ms.min(c_int::MAX as u128) as c_int
        }
    }
}
