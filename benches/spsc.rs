//! Benchmarks for the blocking SPSC queue.
//!
//! Compares spindle against crossbeam-queue's ArrayQueue. ArrayQueue is
//! MPMC and non-blocking, so the cross-thread runs give it a spin-retry
//! loop where spindle uses its built-in blocking.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use crossbeam_queue::ArrayQueue;
use spindle::spsc;
use std::sync::Arc;
use std::thread;

#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
struct Large([u64; 32]); // 256 bytes

// ============================================================================
// Single-threaded latency benchmarks
// ============================================================================

fn bench_single_thread_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread_latency");

    // --- Small message (8 bytes) ---
    group.bench_function("spindle/u64", |b| {
        let (mut tx, mut rx) = spsc::ring_buffer::<u64>(1024);
        b.iter(|| {
            tx.put(black_box(42));
            black_box(rx.take())
        });
    });

    group.bench_function("crossbeam_array/u64", |b| {
        let q = ArrayQueue::<u64>::new(1024);
        b.iter(|| {
            q.push(black_box(42)).unwrap();
            black_box(q.pop().unwrap())
        });
    });

    // --- Large message (256 bytes) ---
    group.bench_function("spindle/256b", |b| {
        let (mut tx, mut rx) = spsc::ring_buffer::<Large>(1024);
        let msg = Large([0; 32]);
        b.iter(|| {
            tx.put(black_box(msg));
            black_box(rx.take())
        });
    });

    group.bench_function("crossbeam_array/256b", |b| {
        let q = ArrayQueue::<Large>::new(1024);
        let msg = Large([0; 32]);
        b.iter(|| {
            q.push(black_box(msg)).unwrap();
            black_box(q.pop().unwrap())
        });
    });

    group.finish();
}

// ============================================================================
// Burst throughput (fill a batch, then drain it)
// ============================================================================

fn bench_burst_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("burst_throughput");

    for batch_size in [100usize, 1000] {
        group.throughput(Throughput::Elements(batch_size as u64));

        group.bench_with_input(
            BenchmarkId::new("spindle", batch_size),
            &batch_size,
            |b, &n| {
                let (mut tx, mut rx) = spsc::ring_buffer::<u64>(n * 2);
                b.iter(|| {
                    for i in 0..n {
                        tx.put(black_box(i as u64));
                    }
                    for _ in 0..n {
                        black_box(rx.take());
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("crossbeam_array", batch_size),
            &batch_size,
            |b, &n| {
                let q = ArrayQueue::<u64>::new(n * 2);
                b.iter(|| {
                    for i in 0..n {
                        q.push(black_box(i as u64)).unwrap();
                    }
                    for _ in 0..n {
                        black_box(q.pop().unwrap());
                    }
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Amortized batch drain vs per-element blocking takes
// ============================================================================

fn bench_batch_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_drain");

    const BATCH: usize = 64;
    group.throughput(Throughput::Elements(BATCH as u64));

    group.bench_function("take_batch_then_plain", |b| {
        let (mut tx, mut rx) = spsc::ring_buffer::<u64>(BATCH * 2);
        b.iter(|| {
            for i in 0..BATCH {
                tx.put(i as u64);
            }
            rx.take_batch(BATCH);
            for _ in 0..BATCH {
                black_box(rx.take_plain());
            }
        });
    });

    group.bench_function("blocking_takes", |b| {
        let (mut tx, mut rx) = spsc::ring_buffer::<u64>(BATCH * 2);
        b.iter(|| {
            for i in 0..BATCH {
                tx.put(i as u64);
            }
            for _ in 0..BATCH {
                black_box(rx.take());
            }
        });
    });

    group.finish();
}

// ============================================================================
// Unidirectional producer-consumer throughput
// ============================================================================

fn bench_cross_thread_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_thread_throughput");

    const MESSAGE_COUNT: usize = 100_000;
    group.throughput(Throughput::Elements(MESSAGE_COUNT as u64));

    group.bench_function("spindle/u64", |b| {
        b.iter(|| {
            let (mut tx, mut rx) = spsc::ring_buffer::<u64>(1024);

            let producer = thread::spawn(move || {
                for i in 0..MESSAGE_COUNT {
                    tx.put(i as u64);
                }
            });

            let consumer = thread::spawn(move || {
                for _ in 0..MESSAGE_COUNT {
                    black_box(rx.take());
                }
            });

            producer.join().unwrap();
            consumer.join().unwrap();
        });
    });

    group.bench_function("crossbeam_array/u64", |b| {
        b.iter(|| {
            let q = Arc::new(ArrayQueue::<u64>::new(1024));

            let q1 = q.clone();
            let producer = thread::spawn(move || {
                for i in 0..MESSAGE_COUNT {
                    while q1.push(i as u64).is_err() {
                        std::hint::spin_loop();
                    }
                }
            });

            let q2 = q.clone();
            let consumer = thread::spawn(move || {
                for _ in 0..MESSAGE_COUNT {
                    loop {
                        match q2.pop() {
                            Some(v) => {
                                black_box(v);
                                break;
                            }
                            None => std::hint::spin_loop(),
                        }
                    }
                }
            });

            producer.join().unwrap();
            consumer.join().unwrap();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_thread_latency,
    bench_burst_throughput,
    bench_batch_drain,
    bench_cross_thread_throughput,
);

criterion_main!(benches);
