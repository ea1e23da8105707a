//! Demo driver: a one-shot timer racing a busy task on one reactor.
//!
//! The timer stops the reactor after `--timer-ms`; the busy task logs a counter
//! every `--interval-ms`. Once the reactor stopped, it is restarted to join the
//! busy task.

use clap::Parser;
use cofiber::demo::{self, DemoConfig};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "cofiber", version, about = "Cooperative timer demo on a single-threaded reactor")]
struct Args {
    /// Directory whose entries are logged before the demo runs.
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Delay before the timer stops the reactor.
    #[arg(long, default_value_t = 1000)]
    timer_ms: u64,

    /// Iterations of the busy task.
    #[arg(long, default_value_t = 20)]
    iterations: u32,

    /// Sleep between two iterations of the busy task.
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,

    /// Use a simulated clock: the demo completes instantly.
    #[arg(long)]
    simulated: bool,
}

impl From<&Args> for DemoConfig {
    fn from(args: &Args) -> Self {
        Self {
            timer: Duration::from_millis(args.timer_ms),
            iterations: args.iterations,
            interval: Duration::from_millis(args.interval_ms),
            simulated: args.simulated,
        }
    }
}

fn main() -> cofiber::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    list_directory(&args.path)?;

    let report = demo::run(&DemoConfig::from(&args))?;
    log::info!(
        "busy task joined after {} iterations ({} before the stop), timer {:?}, {:?} elapsed",
        report.iterations,
        report.iterations_at_stop,
        report.timer,
        report.elapsed
    );

    Ok(())
}

fn list_directory(path: &Path) -> io::Result<()> {
    if !path.is_dir() {
        return Ok(());
    }

    log::info!("{} is a directory containing:", path.display());

    for entry in fs::read_dir(path)? {
        log::info!("{}", entry?.path().display());
    }

    Ok(())
}
