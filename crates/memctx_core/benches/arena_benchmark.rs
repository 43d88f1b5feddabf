//! # Arena Benchmark
//!
//! Carve vs. reuse cost, and the overhead of the thread-local selector.
//!
//! Run with: `cargo bench --package memctx_core`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use memctx_core::{context, Arena, SharedContext};

const CHUNKS: usize = 10_000;

/// Benchmark: carve fresh chunks until the arena holds `CHUNKS`.
fn bench_carve(c: &mut Criterion) {
    let mut group = c.benchmark_group("carve");

    for size in [16_usize, 256, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut arena = Arena::new();
                for _ in 0..CHUNKS {
                    black_box(arena.allocate(size).unwrap());
                }
                arena.destroy()
            });
        });
    }

    group.finish();
}

/// Benchmark: free/allocate ping-pong that always hits the free-list.
fn bench_reuse(c: &mut Criterion) {
    let mut arena = Arena::new();
    let chunk = arena.allocate(64).unwrap();

    c.bench_function("reuse_top_of_free_list", |b| {
        b.iter(|| {
            arena.free(chunk).unwrap();
            black_box(arena.allocate(32).unwrap())
        });
    });
}

/// Benchmark: same ping-pong through the thread-local selector.
fn bench_thread_local_context(c: &mut Criterion) {
    let handle = context::create_arena().unwrap();
    context::set_active(&handle);
    let chunk = context::allocate(64).unwrap();

    c.bench_function("thread_local_reuse", |b| {
        b.iter(|| {
            context::free(chunk).unwrap();
            black_box(context::allocate(32).unwrap())
        });
    });

    context::destroy_arena(handle).unwrap();
}

/// Benchmark: same ping-pong through the lock-guarded context.
fn bench_shared_context(c: &mut Criterion) {
    let shared = SharedContext::default();
    let handle = shared.create_arena().unwrap();
    shared.set_active(&handle);
    let chunk = shared.allocate(64).unwrap();

    c.bench_function("shared_reuse", |b| {
        b.iter(|| {
            shared.free(chunk).unwrap();
            black_box(shared.allocate(32).unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_carve,
    bench_reuse,
    bench_thread_local_context,
    bench_shared_context
);
criterion_main!(benches);
