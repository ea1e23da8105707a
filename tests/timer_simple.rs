use cofiber::time::{sleep, sleep_until};
use cofiber::{Clock, ManualClock, Reactor};
use std::time::{Duration, Instant};

#[test]
fn test_sleep_basic() {
    let mut rt = Reactor::new();
    let handle = rt.handle();

    let start = Instant::now();
    rt.block_on(async move {
        sleep(&handle, Duration::from_millis(50)).await;
    })
    .unwrap();
    let elapsed = start.elapsed();

    assert!(
        elapsed >= Duration::from_millis(50),
        "Sleep should wait at least the specified duration"
    );
}

#[test]
fn test_sleep_zero_duration() {
    let mut rt = Reactor::new();
    let handle = rt.handle();

    let start = Instant::now();
    rt.block_on(async move {
        sleep(&handle, Duration::ZERO).await;
    })
    .unwrap();

    // Should complete without registering a wait
    assert!(
        start.elapsed() < Duration::from_millis(10),
        "Zero duration sleep should be fast"
    );
    assert_eq!(rt.handle().pending_timers(), 0);
}

#[test]
fn test_sleep_in_function() {
    let mut rt = Reactor::new();
    let handle = rt.handle();
    let start = Instant::now();

    rt.block_on(sleep_and_record(handle, start)).unwrap();
}

async fn sleep_and_record(handle: cofiber::Handle, start: Instant) {
    let elapsed_before = start.elapsed();
    handle.sleep(Duration::from_millis(30)).await;
    let elapsed_after = start.elapsed();

    assert!(elapsed_after - elapsed_before >= Duration::from_millis(30));
}

#[test]
fn test_sleep_with_manual_clock_is_instant() {
    let clock = ManualClock::new();
    let mut rt = Reactor::builder().clock(clock.clone()).build();
    let handle = rt.handle();

    let start = Instant::now();
    rt.block_on(async move {
        handle.sleep(Duration::from_secs(3600)).await;
    })
    .unwrap();

    assert_eq!(clock.elapsed(), Duration::from_secs(3600));
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_sleep_until_deadline() {
    let (builder, clock) = Reactor::builder().simulated();
    let mut rt = builder.build();
    let handle = rt.handle();

    let deadline = clock.now() + Duration::from_millis(75);
    let woke_at = rt
        .block_on(async move {
            sleep_until(&handle, deadline).await;
            handle.now()
        })
        .unwrap();

    assert_eq!(woke_at, deadline);
}

#[test]
fn test_sleeps_complete_in_deadline_order() {
    let (builder, _clock) = Reactor::builder().simulated();
    let mut rt = builder.build();
    let handle = rt.handle();
    let order = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));

    for ms in [30u64, 10, 20] {
        let handle = handle.clone();
        let order = order.clone();
        rt.spawn(async move {
            handle.sleep(Duration::from_millis(ms)).await;
            order.borrow_mut().push(ms);
        });
    }

    rt.run().unwrap();

    assert_eq!(*order.borrow(), vec![10, 20, 30]);
}

#[test]
fn test_sleep_with_unbounded_duration() {
    let (builder, clock) = Reactor::builder().simulated();
    let rt = builder.build();
    let handle = rt.handle();

    let sleep = handle.sleep(Duration::MAX);

    assert!(sleep.deadline() > clock.now());
    assert!(sleep.deadline() - clock.now() >= Duration::from_secs(86_400 * 365));
}
