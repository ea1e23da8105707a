//! Timeout utility for futures.
//!
//! [`timeout`] races a future against a [`Sleep`](crate::time::Sleep) on the same
//! reactor. If the deadline is reached first, [`Error::Elapsed`] is returned and
//! the inner future is dropped.
//!
//! # Example
//!
//! ```
//! use cofiber::{Error, ManualClock, Reactor, time::timeout};
//! use std::time::Duration;
//!
//! let mut reactor = Reactor::builder().clock(ManualClock::new()).build();
//! let handle = reactor.handle();
//!
//! let result = reactor
//!     .block_on(async move {
//!         let slow = handle.sleep(Duration::from_millis(100));
//!         timeout(&handle, Duration::from_millis(10), slow).await
//!     })
//!     .unwrap();
//!
//! assert!(matches!(result, Err(Error::Elapsed)));
//! ```

use crate::error::{Error, Result};
use crate::reactor::Handle;

use futures::future::{Either, select};
use std::future::Future;
use std::pin::pin;
use std::time::Duration;

/// Runs `future` with a deadline of `duration` on the reactor's clock.
///
/// Resolves to `Ok` with the output if the future completes first.
///
/// # Errors
///
/// [`Error::Elapsed`] when the deadline is reached first.
pub fn timeout<F>(handle: &Handle, duration: Duration, future: F) -> impl Future<Output = Result<F::Output>>
where
    F: Future,
{
    let deadline = handle.sleep(duration);

    async move {
        match select(pin!(future), pin!(deadline)).await {
            Either::Left((output, _)) => Ok(output),
            Either::Right(((), _)) => Err(Error::Elapsed),
        }
    }
}
