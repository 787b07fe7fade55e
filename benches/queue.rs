//! Benchmarks for RequestQueue polling

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use instance_pool::{RequestQueue, Step};

fn bench_advance(c: &mut Criterion) {
    c.bench_function("queue_advance_1000", |b| {
        b.iter(|| {
            let mut queue = RequestQueue::new(0u32..1000);
            let mut started = 0;
            while let Step::Started(item) = queue.advance(true) {
                black_box(item);
                started += 1;
            }
            started
        })
    });
}

criterion_group!(benches, bench_advance);
criterion_main!(benches);
