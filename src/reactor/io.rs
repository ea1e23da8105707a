//! Non-blocking reads and writes on raw descriptors.
//!
//! The descriptor must be in non-blocking mode (see [`set_nonblocking`]); when
//! the syscall reports `EAGAIN`/`EWOULDBLOCK` the task waits for readiness and
//! retries.

use crate::reactor::core::Handle;

use libc::{F_GETFL, F_SETFL, O_NONBLOCK, fcntl};
use std::io;
use std::os::fd::RawFd;

impl Handle {
    /// Reads into `buffer`, returning `Ok(0)` at end of stream.
    ///
    /// # Errors
    ///
    /// Any error of `read(2)` other than `WouldBlock` and `Interrupted`.
    pub async fn read(&self, fd: RawFd, buffer: &mut [u8]) -> io::Result<usize> {
        loop {
            let result = unsafe { libc::read(fd, buffer.as_mut_ptr().cast(), buffer.len()) };

            if result >= 0 {
                return Ok(result as usize);
            }

            let error = io::Error::last_os_error();
            match error.kind() {
                io::ErrorKind::WouldBlock => self.readable(fd).await?,
                io::ErrorKind::Interrupted => {}
                _ => return Err(error),
            }
        }
    }

    /// Writes from `buffer`, returning how many bytes were accepted.
    ///
    /// # Errors
    ///
    /// Any error of `write(2)` other than `WouldBlock` and `Interrupted`.
    pub async fn write(&self, fd: RawFd, buffer: &[u8]) -> io::Result<usize> {
        loop {
            let result = unsafe { libc::write(fd, buffer.as_ptr().cast(), buffer.len()) };

            if result >= 0 {
                return Ok(result as usize);
            }

            let error = io::Error::last_os_error();
            match error.kind() {
                io::ErrorKind::WouldBlock => self.writable(fd).await?,
                io::ErrorKind::Interrupted => {}
                _ => return Err(error),
            }
        }
    }
}

/// Puts `fd` in non-blocking mode.
///
/// # Errors
///
/// The `fcntl(2)` error, e.g. `EBADF` for a closed descriptor.
pub fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    let flags = unsafe { fcntl(fd, F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    if unsafe { fcntl(fd, F_SETFL, flags | O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}
