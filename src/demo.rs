//! The timer-against-busy-task demonstration run by the `cofiber` binary.
//!
//! A [`Timer`] stops the reactor after [`DemoConfig::timer`] while a busy task logs a
//! counter every [`DemoConfig::interval`]. Once the loop returns, the reactor is
//! restarted to join the busy task and close the timer.

use crate::error::{Error, Result};
use crate::reactor::{Handle, Reactor};
use crate::time::sleep;
use crate::timer::{Timer, TimerState};

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Parameters of [`run`].
#[derive(Clone, Debug)]
pub struct DemoConfig {
    /// Delay before the timer stops the reactor.
    pub timer: Duration,
    /// Iterations of the busy task.
    pub iterations: u32,
    /// Sleep between two iterations of the busy task.
    pub interval: Duration,
    /// Run on a [`ManualClock`](crate::ManualClock) so the demo completes instantly.
    pub simulated: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            timer: Duration::from_millis(1000),
            iterations: 20,
            interval: Duration::from_millis(100),
            simulated: false,
        }
    }
}

/// What a demo run observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DemoReport {
    /// Iterations the busy task had started when the timer stopped the reactor.
    pub iterations_at_stop: u32,
    /// Iterations the busy task completed in total.
    pub iterations: u32,
    /// Terminal state of the timer.
    pub timer: TimerState,
    /// Reactor time from the start of the run until the busy task was joined.
    pub elapsed: Duration,
}

/// Runs the demonstration.
///
/// # Errors
///
/// Any reactor error from the run or the join.
///
/// # Example
///
/// ```
/// use cofiber::TimerState;
/// use cofiber::demo::{self, DemoConfig};
///
/// let report = demo::run(&DemoConfig {
///     simulated: true,
///     ..DemoConfig::default()
/// })
/// .unwrap();
///
/// assert_eq!(report.iterations, 20);
/// assert_eq!(report.timer, TimerState::Fired);
/// ```
pub fn run(config: &DemoConfig) -> Result<DemoReport> {
    let builder = Reactor::builder();
    let builder = if config.simulated {
        builder.simulated().0
    } else {
        builder
    };

    let mut reactor = builder.build();
    let handle = reactor.handle();
    let started = reactor.now();

    let stopper = handle.clone();
    let timer = Timer::spawn(&handle, config.timer, move || {
        log::info!("timer!");
        stopper.stop();
    });

    let progress = Rc::new(Cell::new(0));
    let mut busy = handle.spawn(busy_loop(
        handle.clone(),
        config.iterations,
        config.interval,
        progress.clone(),
    ));

    log::info!("starting");
    reactor.run()?;
    log::info!("stopped");

    let iterations_at_stop = progress.get();

    reactor.restart();
    let (iterations, timer) = reactor.block_on(async move {
        let iterations = busy.join().await?;
        Ok::<_, Error>((iterations, timer.close().await))
    })??;

    Ok(DemoReport {
        iterations_at_stop,
        iterations,
        timer,
        elapsed: reactor.now() - started,
    })
}

async fn busy_loop(
    handle: Handle,
    iterations: u32,
    interval: Duration,
    progress: Rc<Cell<u32>>,
) -> u32 {
    for i in 0..iterations {
        log::info!("{i}");
        progress.set(i + 1);
        sleep(&handle, interval).await;
    }

    iterations
}
