//! Benchmarks for the primitives under contention

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::thread;
use veda_sync::prelude::*;

fn bench_counter(c: &mut Criterion) {
    let mut group = c.benchmark_group("counter_increment");

    for units in [1usize, 2, 4] {
        for mode in [Mode::Exclusive, Mode::Unsynchronized] {
            let id = BenchmarkId::new(format!("{:?}", mode), units);
            group.bench_with_input(id, &units, |b, &units| {
                b.iter(|| {
                    let counter = SharedCounter::new(mode);
                    thread::scope(|s| {
                        for _ in 0..units {
                            s.spawn(|| {
                                for _ in 0..1000 {
                                    counter.increment();
                                }
                            });
                        }
                    });
                    black_box(counter.get())
                });
            });
        }
    }

    group.finish();
}

fn bench_handoff(c: &mut Criterion) {
    c.bench_function("handoff_1000_messages", |b| {
        b.iter(|| {
            let channel = HandoffChannel::new();
            let producer = {
                let channel = channel.clone();
                thread::spawn(move || {
                    for i in 0..1000u32 {
                        channel.send(i);
                    }
                })
            };
            let mut sum = 0u64;
            for _ in 0..1000 {
                sum += u64::from(channel.receive());
            }
            producer.join().unwrap();
            black_box(sum)
        });
    });
}

fn bench_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_drain");

    for threads in [1usize, 2, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let pool = WorkerPool::new(&PoolConfig::with_threads(threads)).unwrap();
                for i in 0..1000u64 {
                    pool.execute(move || {
                        black_box(i * i);
                    })
                    .unwrap();
                }
                pool.shutdown();
                pool.await_termination();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_counter, bench_handoff, bench_pool);
criterion_main!(benches);
