//! Benchmarks for InstancePool
//!
//! Acquire/release on a warm pool should not touch the factory.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use instance_pool::{Instance, InstancePool};

fn bench_acquire_release(c: &mut Criterion) {
    let pool = InstancePool::with_capacity(64, || vec![0u8; 1024]);

    c.bench_function("acquire_release_warm", |b| {
        b.iter(|| {
            let buf = pool.acquire().unwrap();
            pool.release(black_box(buf)).unwrap();
        })
    });
}

fn bench_acquire_with_outstanding(c: &mut Criterion) {
    let mut group = c.benchmark_group("acquire_with_outstanding");

    for outstanding in [8usize, 64, 512] {
        let pool = InstancePool::with_capacity(outstanding + 1, || 0u64);
        // Hold most members so the free set is small and sits at the end
        let _held: Vec<Instance<u64>> =
            (0..outstanding).map(|_| pool.acquire().unwrap()).collect();

        group.bench_with_input(BenchmarkId::from_parameter(outstanding), &pool, |b, pool| {
            b.iter(|| {
                let item = pool.acquire().unwrap();
                pool.release(item).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_prewarm(c: &mut Criterion) {
    c.bench_function("prewarm_256", |b| {
        b.iter(|| {
            let pool = InstancePool::new();
            pool.prewarm_with(Some(|| vec![0u8; 256]), black_box(256)).unwrap()
        })
    });
}

criterion_group!(benches, bench_acquire_release, bench_acquire_with_outstanding, bench_prewarm);
criterion_main!(benches);
