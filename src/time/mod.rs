//! Time utilities: clocks, async sleep and timeout.
//!
//! - [`Clock`] with its [`SystemClock`] and [`ManualClock`] implementations
//! - [`sleep`] / [`sleep_until`] for non-blocking delays
//! - [`timeout`] for running a future with a deadline
//!
//! Every function takes the reactor [`Handle`](crate::Handle) explicitly: time is
//! read from the clock that reactor was built with.
//!
//! # Example: Timeout
//!
//! ```
//! use cofiber::{ManualClock, Reactor, time::{sleep, timeout}};
//! use std::time::Duration;
//!
//! let mut reactor = Reactor::builder().clock(ManualClock::new()).build();
//! let handle = reactor.handle();
//!
//! let result = reactor
//!     .block_on(async move {
//!         let inner = handle.clone();
//!         timeout(&handle, Duration::from_millis(100), async move {
//!             sleep(&inner, Duration::from_millis(50)).await;
//!             "done"
//!         })
//!         .await
//!     })
//!     .unwrap();
//!
//! assert_eq!(result.unwrap(), "done");
//! ```

pub mod clock;
pub mod sleep;
pub mod timeout;

pub use clock::{Clock, ManualClock, SystemClock};
pub(crate) use clock::far_future;
pub use sleep::{Sleep, sleep, sleep_until};
pub use timeout::timeout;
