//! Lifecycle tests for WorkerThread: drain, restart, and multi-producer ordering

use message_thread::prelude::*;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::Duration;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_send_end_drop_invokes_callback_once() {
    init_logger();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);

    let worker = WorkerThread::new(move |item: &'static str| {
        // Slow enough that the drop below must actually wait
        thread::sleep(Duration::from_millis(20));
        sink.lock().push(item);
    });

    worker.send("item").expect("Failed to send item");
    worker.end();
    drop(worker);

    assert_eq!(*calls.lock(), vec!["item"]);
}

#[test]
fn test_restart_delivers_second_item_exactly_once() {
    init_logger();
    let counts = Arc::new(Mutex::new(HashMap::new()));
    let sink = Arc::clone(&counts);

    let worker = WorkerThread::new(move |item: u32| {
        *sink.lock().entry(item).or_insert(0) += 1;
    });

    worker.start().expect("Failed to start worker");
    worker.end();
    assert_eq!(worker.state(), WorkerState::Stopping);

    worker.send(2).expect("Failed to send after end");
    assert_eq!(worker.state(), WorkerState::Running);

    worker.join().expect("Failed to join worker");
    assert_eq!(worker.state(), WorkerState::Idle);

    let counts = counts.lock();
    assert_eq!(counts.get(&2), Some(&1));
    assert_eq!(counts.len(), 1);
    assert_eq!(worker.stats().get_threads_spawned(), 2);
}

#[test]
fn test_first_thread_joined_before_second_spawn() {
    init_logger();
    let live = Arc::new(AtomicUsize::new(0));
    let max_live = Arc::new(AtomicUsize::new(0));
    let (l, m) = (Arc::clone(&live), Arc::clone(&max_live));

    let worker = WorkerThread::new(move |_: u8| {
        let now = l.fetch_add(1, Ordering::SeqCst) + 1;
        m.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        l.fetch_sub(1, Ordering::SeqCst);
    });

    for _ in 0..3 {
        worker.send(0).expect("Failed to send");
        worker.end();
    }
    drop(worker);

    assert_eq!(max_live.load(Ordering::SeqCst), 1);
}

#[test]
fn test_size_at_quiescent_point() {
    init_logger();
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let worker = WorkerThread::new(move |item: u32| {
        if item == 0 {
            entered_tx.send(()).unwrap();
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
        }
    });
    assert!(worker.is_empty());
    assert_eq!(worker.len(), 0);

    // Park the thread inside the callback, then queue one more item
    worker.send(0).expect("Failed to send");
    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("callback never ran");
    worker.send(1).expect("Failed to send");

    assert_eq!(worker.len(), 1);
    assert!(!worker.is_empty());

    release_tx.send(()).unwrap();
    worker.join().expect("Failed to join worker");
    assert!(worker.is_empty());
}

#[test]
fn test_callbacks_are_serialized() {
    init_logger();
    let in_callback = Arc::new(AtomicUsize::new(0));
    let overlap = Arc::new(AtomicUsize::new(0));
    let (i, o) = (Arc::clone(&in_callback), Arc::clone(&overlap));

    let worker = Arc::new(WorkerThread::new(move |_: usize| {
        if i.fetch_add(1, Ordering::SeqCst) != 0 {
            o.fetch_add(1, Ordering::SeqCst);
        }
        thread::yield_now();
        i.fetch_sub(1, Ordering::SeqCst);
    }));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let w = Arc::clone(&worker);
            thread::spawn(move || {
                for n in 0..100 {
                    w.send(n).expect("Failed to send");
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("producer panicked");
    }

    worker.join().expect("Failed to join worker");
    assert_eq!(overlap.load(Ordering::SeqCst), 0);
    assert_eq!(worker.stats().get_items_processed(), 400);
}

#[test]
fn test_multi_producer_order_and_batches() {
    init_logger();
    const PRODUCERS: usize = 4;
    const BATCHES: usize = 25;
    const BATCH_LEN: usize = 8;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let worker = Arc::new(WorkerThread::new(move |item: (usize, usize)| {
        sink.lock().push(item);
    }));

    let barrier = Arc::new(Barrier::new(PRODUCERS));
    let handles: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let w = Arc::clone(&worker);
            let b = Arc::clone(&barrier);
            thread::spawn(move || {
                b.wait();
                for batch in 0..BATCHES {
                    let start = batch * BATCH_LEN;
                    w.send_multi((start..start + BATCH_LEN).map(|seq| (producer, seq)))
                        .expect("Failed to send batch");
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("producer panicked");
    }
    worker.join().expect("Failed to join worker");

    let seen = seen.lock();
    assert_eq!(seen.len(), PRODUCERS * BATCHES * BATCH_LEN);

    // Batches arrive as contiguous runs
    for run in seen.chunks(BATCH_LEN) {
        let (producer, first) = run[0];
        assert_eq!(first % BATCH_LEN, 0);
        for (offset, &(p, seq)) in run.iter().enumerate() {
            assert_eq!(p, producer);
            assert_eq!(seq, first + offset);
        }
    }

    // Each producer's own order is preserved
    for producer in 0..PRODUCERS {
        let mine: Vec<usize> = seen
            .iter()
            .filter(|(p, _)| *p == producer)
            .map(|&(_, seq)| seq)
            .collect();
        assert_eq!(mine, (0..BATCHES * BATCH_LEN).collect::<Vec<_>>());
    }
}

#[test]
fn test_drop_without_start_does_not_block() {
    let worker: WorkerThread<u32> = WorkerThread::new(|_: u32| {});
    assert_eq!(worker.state(), WorkerState::Idle);
    drop(worker);
}

#[test]
fn test_background_worker_processes_items() {
    init_logger();
    let config = WorkerThreadConfig::new("background-test").low_priority();
    let (tx, rx) = mpsc::channel();
    let worker = WorkerThread::with_config(config, move |item: u32| {
        tx.send(item).unwrap();
    })
    .expect("Failed to create worker");

    worker.send_multi(vec![1, 2, 3]).expect("Failed to send");
    drop(worker);

    assert_eq!(rx.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn test_available_parallelism_positive() {
    assert!(available_parallelism() >= 1);
}
