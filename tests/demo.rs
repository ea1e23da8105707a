use cofiber::TimerState;
use cofiber::demo::{self, DemoConfig};
use std::time::Duration;

fn simulated() -> DemoConfig {
    DemoConfig {
        simulated: true,
        ..DemoConfig::default()
    }
}

#[test]
fn test_demo_default_run() {
    let report = demo::run(&simulated()).unwrap();

    assert_eq!(report.iterations, 20);
    assert_eq!(report.timer, TimerState::Fired);
    // Iterations 0..=10 share the t = 1000ms batch with the stopping timer.
    assert_eq!(report.iterations_at_stop, 11);
    assert_eq!(report.elapsed, Duration::from_millis(2000));
}

#[test]
fn test_demo_timer_after_busy_task() {
    let report = demo::run(&DemoConfig {
        timer: Duration::from_millis(500),
        iterations: 3,
        ..simulated()
    })
    .unwrap();

    // The busy task finishes at 300ms; the stop at 500ms ends the first run.
    assert_eq!(report.iterations_at_stop, 3);
    assert_eq!(report.iterations, 3);
    assert_eq!(report.timer, TimerState::Fired);
    assert_eq!(report.elapsed, Duration::from_millis(500));
}

#[test]
fn test_demo_with_real_clock() {
    let report = demo::run(&DemoConfig {
        timer: Duration::from_millis(20),
        iterations: 4,
        interval: Duration::from_millis(10),
        simulated: false,
    })
    .unwrap();

    assert_eq!(report.iterations, 4);
    assert_eq!(report.timer, TimerState::Fired);
    assert!(report.iterations_at_stop >= 1);
    assert!(report.elapsed >= Duration::from_millis(30));
}
