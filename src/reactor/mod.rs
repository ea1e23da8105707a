//! Event-driven reactor module.
//!
//! - [`core`]: the reactor loop and its [`Handle`](core::Handle)
//! - [`event`]: `poll(2)` readiness registry
//! - [`timers`]: deadline-ordered timer queue
//! - [`future`]: timer-wait and readiness futures
//! - [`io`]: non-blocking read/write on raw descriptors

pub mod core;
pub mod event;
pub mod future;
pub mod io;
pub(crate) mod timers;

pub use self::core::{Handle, Reactor};
pub use event::Interest;
pub use future::Readiness;
pub use io::set_nonblocking;
pub use timers::WaitOutcome;
