use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use message_thread::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

fn benchmark_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("blocking_queue");

    group.bench_function("push_pop_1000", |b| {
        let queue = BlockingQueue::new();
        b.iter(|| {
            for i in 0..1000u64 {
                queue.push(i);
            }
            for _ in 0..1000 {
                black_box(queue.pop());
            }
        });
    });

    group.bench_function("push_multi_1000", |b| {
        let queue = BlockingQueue::new();
        b.iter(|| {
            queue.push_multi(0..1000u64);
            black_box(queue.drain());
        });
    });

    group.finish();
}

fn benchmark_worker_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("worker_thread");

    group.bench_function("start_stop", |b| {
        b.iter(|| {
            let worker = WorkerThread::new(|n: u64| {
                black_box(n);
            });
            worker.start().expect("Failed to start worker");
            worker.join().expect("Failed to join worker");
        });
    });

    group.bench_function("send_1000", |b| {
        b.iter_batched(
            || {
                let counter = Arc::new(AtomicU64::new(0));
                let c = Arc::clone(&counter);
                let worker = WorkerThread::new(move |n: u64| {
                    c.fetch_add(n, Ordering::Relaxed);
                });
                worker.start().expect("Failed to start worker");
                worker
            },
            |worker| {
                for i in 0..1000 {
                    worker.send(i).expect("Failed to send");
                }
                worker.join().expect("Failed to join worker");
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("send_multi_1000", |b| {
        b.iter_batched(
            || {
                let worker = WorkerThread::new(|n: u64| {
                    black_box(n);
                });
                worker.start().expect("Failed to start worker");
                worker
            },
            |worker| {
                worker.send_multi(0..1000).expect("Failed to send");
                worker.join().expect("Failed to join worker");
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, benchmark_queue, benchmark_worker_thread);
criterion_main!(benches);
