use bounded_pool::{Config as PoolConfig, Pool};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::{
    hint::black_box,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

fn new_pool(config: PoolConfig) -> Pool {
    Pool::with_config(config.with_poll_interval(Duration::from_millis(50))).unwrap()
}

// Benchmark 1: Submit + wait overhead
fn bench_submit_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_overhead");

    for size in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));

        for (label, config) in [
            ("cpu_bound", PoolConfig::cpu_bound()),
            ("io_bound", PoolConfig::io_bound()),
        ] {
            group.bench_with_input(BenchmarkId::new(label, size), &size, |b, &size| {
                let pool = new_pool(config.clone());
                b.iter(|| {
                    for i in 0..size {
                        pool.submit(move || {
                            black_box(i);
                        })
                        .unwrap();
                    }
                    pool.wait_completion();
                });
            });
        }
    }

    group.finish();
}

// Benchmark 2: Queue capacity vs producer throttling
fn bench_queue_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_capacity");
    let workers = num_cpus::get();

    for factor in [1, 4, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(factor), &factor, |b, &factor| {
            let pool = new_pool(PoolConfig::new(workers).with_queue_capacity(workers * factor));
            let counter = Arc::new(AtomicUsize::new(0));
            b.iter(|| {
                for _ in 0..5000 {
                    let counter = counter.clone();
                    pool.submit(move || {
                        counter.fetch_add(1, Ordering::Relaxed);
                    })
                    .unwrap();
                }
                pool.wait_completion();
            });
        });
    }

    group.finish();
}

// Benchmark 3: map
fn bench_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("map");
    let pool = new_pool(PoolConfig::default());

    for size in [1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                pool.map(|x: u64| {
                    black_box(x * x);
                }, 0..size as u64)
                .unwrap();
                pool.wait_completion();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_submit_overhead, bench_queue_capacity, bench_map);
criterion_main!(benches);
