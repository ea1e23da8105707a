use cofiber::time::timeout;
use cofiber::{Error, Reactor, yield_now};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[test]
fn test_spawn_basic() {
    let mut rt = Reactor::new();
    let completed = Rc::new(RefCell::new(false));
    let completed_clone = completed.clone();

    rt.spawn(async move {
        *completed_clone.borrow_mut() = true;
    });
    rt.run().unwrap();

    assert!(*completed.borrow(), "Spawned task should have completed");
    assert_eq!(rt.handle().task_count(), 0);
}

#[test]
fn test_spawn_multiple() {
    let mut rt = Reactor::new();
    let handle = rt.handle();
    let counter = Rc::new(RefCell::new(0));

    let total = rt
        .block_on(async move {
            let mut tasks = Vec::new();
            for amount in [1, 10, 100] {
                let counter = counter.clone();
                tasks.push(handle.spawn(async move {
                    *counter.borrow_mut() += amount;
                }));
            }

            for task in tasks {
                task.await.unwrap();
            }

            *counter.borrow()
        })
        .unwrap();

    assert_eq!(total, 111, "All spawned tasks should execute");
}

#[test]
fn test_spawn_nested_runs_after_parent() {
    let mut rt = Reactor::new();
    let handle = rt.handle();
    let log = Rc::new(RefCell::new(Vec::new()));

    let parent_log = log.clone();
    rt.spawn(async move {
        parent_log.borrow_mut().push("parent start");

        let child_log = parent_log.clone();
        handle.spawn(async move {
            child_log.borrow_mut().push("child");
        });

        parent_log.borrow_mut().push("parent end");
    });

    rt.run().unwrap();

    assert_eq!(*log.borrow(), vec!["parent start", "parent end", "child"]);
}

#[test]
fn test_join_returns_output() {
    let mut rt = Reactor::new();
    let handle = rt.handle();

    let value = rt
        .block_on(async move {
            let sleeper = handle.clone();
            let mut task = handle.spawn(async move {
                sleeper.sleep(Duration::from_millis(5)).await;
                String::from("done")
            });

            assert!(!task.is_finished());
            task.join().await
        })
        .unwrap()
        .unwrap();

    assert_eq!(value, "done");
}

#[test]
fn test_double_join_fails() {
    let mut rt = Reactor::new();
    let handle = rt.handle();

    let (first, second, joinable) = rt
        .block_on(async move {
            let mut task = handle.spawn(async { 1 });
            let first = task.join().await;
            let second = task.join().await;
            (first, second, task.joinable())
        })
        .unwrap();

    assert!(matches!(first, Ok(1)));
    assert!(matches!(second, Err(Error::AlreadyJoined)));
    assert!(!joinable);
}

#[test]
fn test_join_finished_task() {
    let mut rt = Reactor::new();

    let mut task = rt.spawn(async { 3 });
    rt.run().unwrap();

    assert!(task.is_finished());
    assert!(task.joinable());
    assert_eq!(rt.block_on(task.join()).unwrap().unwrap(), 3);
}

#[test]
fn test_round_robin_yield_order() {
    let mut rt = Reactor::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    for name in ["a", "b", "c"] {
        let order = order.clone();
        rt.spawn(async move {
            for i in 0..2 {
                order.borrow_mut().push(format!("{name}{i}"));
                yield_now().await;
            }
        });
    }

    rt.run().unwrap();

    assert_eq!(*order.borrow(), vec!["a0", "b0", "c0", "a1", "b1", "c1"]);
}

#[test]
fn test_dropped_handle_detaches_task() {
    let mut rt = Reactor::new();
    let handle = rt.handle();
    let ran = Rc::new(RefCell::new(false));

    let flag = ran.clone();
    drop(rt.spawn(async move {
        handle.sleep(Duration::from_millis(1)).await;
        *flag.borrow_mut() = true;
    }));

    rt.run().unwrap();

    assert!(*ran.borrow());
}

#[test]
fn test_task_ids_are_distinct_while_alive() {
    let rt = Reactor::new();

    let first = rt.spawn(async {});
    let second = rt.spawn(async {});

    assert_ne!(first.id(), second.id());
    assert_eq!(rt.handle().task_count(), 2);
    assert_eq!(first.id().to_string(), "task#0");
}

#[test]
fn test_stale_waker_does_not_repoll_reused_slot() {
    let (builder, clock) = Reactor::builder().simulated();
    let mut rt = builder.build();
    let handle = rt.handle();
    let order = Rc::new(RefCell::new(Vec::new()));

    // The slow task keeps the joiner's waker after the joiner gave up on it.
    let slow_handle = handle.clone();
    let slow = rt.spawn(async move {
        slow_handle.sleep(Duration::from_millis(20)).await;
    });

    let joiner_handle = handle.clone();
    let joiner = rt.spawn(async move {
        let result = timeout(&joiner_handle, Duration::from_millis(10), slow).await;
        assert!(matches!(result, Err(Error::Elapsed)));
    });
    let stale_id = joiner.id();

    // Spawned once the joiner finished, so the first one reuses its slot.
    let spawner = handle.clone();
    let spawned_order = order.clone();
    let mut spawned = rt.spawn(async move {
        spawner.sleep(Duration::from_millis(15)).await;

        let mut ids = Vec::new();
        for name in ["c", "d"] {
            let sleeper = spawner.clone();
            let order = spawned_order.clone();
            // Both wake in the same turn as the slow task completes.
            let start = spawner.now() + Duration::from_millis(5);
            let task = spawner.spawn(async move {
                sleeper.sleep_until(start).await;
                for i in 0..3 {
                    order.borrow_mut().push(format!("{name}{i}"));
                    yield_now().await;
                }
            });
            ids.push(task.id());
        }
        ids
    });

    rt.run().unwrap();

    let ids = rt.block_on(spawned.join()).unwrap().unwrap();
    assert_ne!(ids[0], stale_id, "ids stay unique across slot reuse");
    assert_eq!(clock.elapsed(), Duration::from_millis(20));
    assert_eq!(
        *order.borrow(),
        vec!["c0", "d0", "c1", "d1", "c2", "d2"],
        "a stale wake must not give a task a second turn in one batch"
    );
}

