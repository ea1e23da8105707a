use cofiber::{
    Error, ManualClock, Reactor, ReactorBuilder, RoundRobin, SchedulingPolicy, TaskId, yield_now,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[test]
fn test_builder_creation() {
    let rt = ReactorBuilder::new().build();
    drop(rt);
}

#[test]
fn test_builder_immediate_result() {
    let mut rt = ReactorBuilder::new().capacity(4).build();
    let value = 42;

    let result = rt.block_on(async { value }).unwrap();

    assert_eq!(result, 42, "Future should return correct value");
}

#[test]
fn test_builder_multiple_instances() {
    let mut rt1 = ReactorBuilder::new().build();
    let mut rt2 = ReactorBuilder::new().policy(RoundRobin::new()).build();

    let result1 = rt1.block_on(async { 10 }).unwrap();
    let result2 = rt2.block_on(async { 20 }).unwrap();

    assert_eq!(result1, 10);
    assert_eq!(result2, 20);
}

#[test]
fn test_builder_clocks_are_per_reactor() {
    let first = ManualClock::new();
    let second = ManualClock::new();
    let mut rt1 = ReactorBuilder::new().clock(first.clone()).build();
    let mut rt2 = ReactorBuilder::new().clock(second.clone()).build();

    let h1 = rt1.handle();
    rt1.block_on(async move { h1.sleep(Duration::from_secs(5)).await })
        .unwrap();

    let h2 = rt2.handle();
    rt2.block_on(async move { h2.sleep(Duration::from_secs(1)).await })
        .unwrap();

    assert_eq!(first.elapsed(), Duration::from_secs(5));
    assert_eq!(second.elapsed(), Duration::from_secs(1));
}

// Last-in first-out: the most recently woken task runs first.
#[derive(Default)]
struct Lifo(Vec<TaskId>);

impl SchedulingPolicy for Lifo {
    fn awakened(&mut self, task: TaskId) {
        self.0.push(task);
    }

    fn pick_next(&mut self) -> Option<TaskId> {
        self.0.pop()
    }

    fn ready_count(&self) -> usize {
        self.0.len()
    }
}

#[test]
fn test_builder_custom_policy() {
    let mut rt = ReactorBuilder::new().policy(Lifo::default()).build();
    let order = Rc::new(RefCell::new(Vec::new()));

    for name in ["a", "b", "c"] {
        let order = order.clone();
        rt.spawn(async move { order.borrow_mut().push(name) });
    }

    rt.run().unwrap();

    assert_eq!(*order.borrow(), vec!["c", "b", "a"]);
}

#[test]
fn test_stop_is_idempotent() {
    let mut rt = Reactor::new();
    let ran = Rc::new(RefCell::new(false));

    let flag = ran.clone();
    rt.spawn(async move { *flag.borrow_mut() = true });

    rt.stop();
    rt.stop();
    assert!(rt.is_stopped());

    rt.run().unwrap();
    assert!(!*ran.borrow(), "stopped reactor must not run tasks");

    rt.restart();
    assert!(!rt.is_stopped());
    rt.run().unwrap();
    assert!(*ran.borrow());
}

#[test]
fn test_stop_lets_the_batch_finish() {
    let mut rt = Reactor::new();
    let handle = rt.handle();
    let log = Rc::new(RefCell::new(Vec::new()));

    let stopper_log = log.clone();
    rt.spawn(async move {
        handle.stop();
        stopper_log.borrow_mut().push("stop");
    });

    let yielder_log = log.clone();
    rt.spawn(async move {
        yielder_log.borrow_mut().push("before yield");
        yield_now().await;
        yielder_log.borrow_mut().push("after yield");
    });

    rt.run().unwrap();
    assert_eq!(*log.borrow(), vec!["stop", "before yield"]);
    assert_eq!(rt.handle().task_count(), 1);

    rt.restart();
    rt.run().unwrap();
    assert_eq!(*log.borrow(), vec!["stop", "before yield", "after yield"]);
    assert_eq!(rt.handle().task_count(), 0);
}

#[test]
fn test_block_on_stopped_reactor() {
    let (builder, clock) = ReactorBuilder::new().simulated();
    let mut rt = builder.build();
    let handle = rt.handle();

    rt.stop();

    // Ready futures still complete on their first poll.
    assert_eq!(rt.block_on(async { 5 }).unwrap(), 5);

    let sleeper = handle.clone();
    let result = rt.block_on(async move { sleeper.sleep(Duration::from_millis(10)).await });
    assert!(matches!(result, Err(Error::Stopped)));
    assert_eq!(clock.elapsed(), Duration::ZERO);

    rt.restart();
    rt.block_on(async move { handle.sleep(Duration::from_millis(10)).await })
        .unwrap();
    assert_eq!(clock.elapsed(), Duration::from_millis(10));
}

#[test]
fn test_block_on_without_work_is_idle() {
    let mut rt = Reactor::new();

    let result = rt.block_on(futures::future::pending::<()>());

    assert!(matches!(result, Err(Error::Idle)));
}

#[test]
fn test_turn_never_idles() {
    let (builder, clock) = ReactorBuilder::new().simulated();
    let mut rt = builder.build();
    let handle = rt.handle();

    let sleeper = handle.clone();
    let task = rt.spawn(async move { sleeper.sleep(Duration::from_millis(50)).await });

    rt.turn().unwrap();
    rt.turn().unwrap();

    assert_eq!(clock.elapsed(), Duration::ZERO);
    assert_eq!(handle.pending_timers(), 1);
    assert!(!task.is_finished());

    clock.advance(Duration::from_millis(50));
    rt.turn().unwrap();
    rt.turn().unwrap();

    assert!(task.is_finished());
}
