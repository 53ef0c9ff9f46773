mod common;

use common::{PATIENCE, init_logger};
use spindle::{Executor, TaskError};

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_submit_returns_increasing_ids() {
    init_logger();
    let executor = Executor::new();

    let ids: Vec<_> = (0..50).map(|i| executor.submit(move || i)).collect();

    for pair in ids.windows(2) {
        assert!(pair[0] < pair[1], "{} should precede {}", pair[0], pair[1]);
    }
    assert_eq!(ids[0].as_u64(), 0);
    assert_eq!(executor.issued(), 50);
}

#[test]
fn test_three_tasks_delivered_once() {
    init_logger();
    let executor = Executor::new();

    for n in 1..=3 {
        executor.submit(move || n);
    }

    let mut values = HashSet::new();
    for _ in 0..3 {
        let task = executor
            .pop_timeout::<i32>(PATIENCE)
            .expect("task should complete");
        assert!(values.insert(task.into_result().unwrap()));
    }

    assert_eq!(values, HashSet::from([1, 2, 3]));
    assert!(executor.try_pop::<i32>().is_none());
    assert_eq!(executor.pending(), 0);
}

#[test]
fn test_every_task_delivered_exactly_once() {
    init_logger();
    let executor = Executor::new();

    let submitted: HashSet<_> = (0..100u64).map(|i| executor.submit(move || i * 2)).collect();

    let mut seen = HashSet::new();
    while seen.len() < submitted.len() {
        let task = executor
            .pop_timeout::<u64>(PATIENCE)
            .expect("task should complete");

        assert_eq!(task.value(), Some(&(task.id().as_u64() * 2)));
        assert!(seen.insert(task.id()), "{} delivered twice", task.id());
    }

    assert_eq!(seen, submitted);
    assert!(executor.pop_timeout::<u64>(Duration::from_millis(50)).is_none());
}

#[test]
fn test_submit_does_not_wait_for_completion() {
    init_logger();
    let executor = Executor::new();
    let (open, gate) = common::gate();

    let start = Instant::now();
    let id = executor.submit(move || {
        let _ = gate.recv();
        "done"
    });
    assert!(start.elapsed() < PATIENCE);
    assert!(executor.try_pop::<&str>().is_none());

    open.send(()).unwrap();

    let task = executor
        .pop_timeout::<&str>(PATIENCE)
        .expect("task should complete");
    assert_eq!(task.id(), id);
    assert_eq!(task.value(), Some(&"done"));
}

#[test]
fn test_try_pop_on_empty_returns_immediately() {
    init_logger();
    let executor = Executor::new();

    let start = Instant::now();
    for _ in 0..1000 {
        assert!(executor.try_pop::<u8>().is_none());
        assert!(executor.try_pop_any().is_none());
    }

    assert!(start.elapsed() < PATIENCE);
}

#[test]
fn test_panic_is_delivered_as_failure() {
    init_logger();
    let executor = Executor::new();

    let id = executor.submit(|| -> u32 { panic!("boom") });

    let task = executor
        .pop_timeout::<u32>(PATIENCE)
        .expect("failure should be delivered");

    assert_eq!(task.id(), id);
    assert!(task.is_failure());
    assert!(task.value().is_none());
    match task.into_result() {
        Err(TaskError::Panicked { message }) => assert_eq!(message, "boom"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_formatted_panic_message_is_kept() {
    init_logger();
    let executor = Executor::new();

    executor.submit(|| -> u8 { panic!("failed at step {}", 3) });

    let task = executor
        .pop_timeout::<u8>(PATIENCE)
        .expect("failure should be delivered");

    assert_eq!(
        task.error().map(ToString::to_string),
        Some("task panicked: failed at step 3".to_owned())
    );
}

#[test]
fn test_fallible_error_is_delivered_as_failure() {
    init_logger();
    let executor = Executor::new();

    let ok = executor.submit_fallible(|| Ok::<_, std::io::Error>(5u8));
    let bad = executor.submit_fallible(|| Err::<u8, _>("bad input"));

    let mut outcomes = Vec::new();
    for _ in 0..2 {
        outcomes.push(
            executor
                .pop_timeout::<u8>(PATIENCE)
                .expect("task should complete"),
        );
    }
    outcomes.sort_by_key(|task| task.id());

    assert_eq!(outcomes[0].id(), ok);
    assert_eq!(outcomes[0].value(), Some(&5));

    assert_eq!(outcomes[1].id(), bad);
    let err = outcomes[1].error().expect("task should have failed");
    assert!(matches!(err, TaskError::Failed(_)));
    assert_eq!(err.to_string(), "task failed: bad input");
}

#[test]
fn test_outcomes_are_routed_by_result_type() {
    init_logger();
    let executor = Executor::new();

    let text = executor.submit(|| String::from("hello"));
    let number = executor.submit(|| 7u32);

    common::wait_for_pending(&executor, 2);

    assert!(executor.try_pop::<i64>().is_none());

    let task = executor.try_pop::<u32>().expect("u32 task should be ready");
    assert_eq!(task.id(), number);
    assert!(executor.try_pop::<u32>().is_none());

    let task = executor.try_pop::<String>().expect("String task should be ready");
    assert_eq!(task.id(), text);
    assert_eq!(task.value().map(String::as_str), Some("hello"));
}

#[test]
fn test_try_pop_any_and_downcast() {
    init_logger();
    let executor = Executor::new();

    let id = executor.submit(|| vec![1u8, 2, 3]);
    common::wait_for_pending(&executor, 1);

    let task = executor.try_pop_any().expect("task should be ready");
    assert_eq!(task.id(), id);

    let task = task.downcast::<String>().expect_err("value is not a String");
    let task = task.downcast::<Vec<u8>>().expect("value is a Vec<u8>");
    let (task_id, outcome) = task.into_parts();
    assert_eq!(task_id, id);
    assert_eq!(outcome.unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_consumer_on_another_thread() {
    init_logger();
    let executor = Arc::new(Executor::new());

    let consumer = {
        let executor = executor.clone();
        thread::spawn(move || {
            let mut sum = 0;
            let mut received = 0;
            let deadline = Instant::now() + PATIENCE;

            while received < 20 && Instant::now() < deadline {
                match executor.try_pop::<usize>() {
                    Some(task) => {
                        sum += task.into_result().unwrap();
                        received += 1;
                    }
                    None => thread::yield_now(),
                }
            }

            sum
        })
    };

    for i in 0..20usize {
        executor.submit(move || i);
    }

    assert_eq!(consumer.join().unwrap(), (0..20).sum::<usize>());
}

#[test]
fn test_concurrent_consumers_each_task_delivered_once() {
    init_logger();
    let executor = Arc::new(Executor::new());
    let delivered = Arc::new(AtomicUsize::new(0));
    let total = 200usize;

    let consumers: Vec<_> = (0..2)
        .map(|_| {
            let executor = executor.clone();
            let delivered = delivered.clone();
            thread::spawn(move || {
                let mut ids = Vec::new();
                let deadline = Instant::now() + PATIENCE;

                while delivered.load(Ordering::SeqCst) < total && Instant::now() < deadline {
                    match executor.try_pop::<usize>() {
                        Some(task) => {
                            assert_eq!(task.value(), Some(&(task.id().as_u64() as usize)));
                            ids.push(task.id());
                            delivered.fetch_add(1, Ordering::SeqCst);
                        }
                        None => thread::yield_now(),
                    }
                }

                ids
            })
        })
        .collect();

    let submitted: HashSet<_> = (0..total).map(|i| executor.submit(move || i)).collect();

    let mut seen = HashSet::new();
    for consumer in consumers {
        for id in consumer.join().unwrap() {
            assert!(seen.insert(id), "{id} delivered to more than one consumer");
        }
    }

    assert_eq!(seen, submitted);
    assert!(executor.try_pop::<usize>().is_none());
}

#[test]
fn test_tasks_run_concurrently() {
    init_logger();
    let executor = Executor::new();
    let barrier = Arc::new(std::sync::Barrier::new(4));

    for _ in 0..4 {
        let barrier = barrier.clone();
        // Only completes if all four tasks are running at the same time.
        executor.submit(move || barrier.wait().is_leader());
    }

    let leaders = (0..4)
        .map(|_| {
            executor
                .pop_timeout::<bool>(PATIENCE)
                .expect("task should complete")
                .into_result()
                .unwrap()
        })
        .filter(|leader| *leader)
        .count();

    assert_eq!(leaders, 1);
}
