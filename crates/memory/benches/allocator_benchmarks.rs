//! Allocator benchmarks
//!
//! Compares the stack and pool allocators against the system allocator on
//! small engine-style workloads.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use onyx_memory::aligned::{alloc_aligned, free_aligned};
use onyx_memory::allocator::{PoolAllocator, StackAllocator};
use std::alloc::Layout;
use std::hint::black_box;

const MB: usize = 1024 * 1024;

/// Benchmark single allocation/release cycle
fn bench_single_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_allocation");

    group.bench_function("stack_64b", |b| {
        let stack = StackAllocator::production(MB).unwrap();

        b.iter(|| {
            let marker = stack.top();
            let ptr = stack.alloc(64, 8);
            stack.free_to_marker(marker);
            black_box(ptr);
        });
    });

    group.bench_function("pool_64b", |b| {
        let pool = PoolAllocator::production(64, 1024).unwrap();

        b.iter(|| unsafe {
            let ptr = pool.alloc();
            pool.free(ptr);
            black_box(ptr);
        });
    });

    group.bench_function("aligned_64b", |b| {
        b.iter(|| unsafe {
            let ptr = alloc_aligned(64, 64);
            free_aligned(ptr);
            black_box(ptr);
        });
    });

    // System allocator (baseline)
    group.bench_function("system_64b", |b| {
        let layout = Layout::from_size_align(64, 8).unwrap();

        b.iter(|| unsafe {
            let ptr = std::alloc::alloc(layout);
            std::alloc::dealloc(ptr, layout);
            black_box(ptr);
        });
    });

    group.finish();
}

/// Benchmark a frame's worth of allocations released at once
fn bench_frame_allocations(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_allocations");
    group.throughput(Throughput::Elements(100));

    group.bench_function("stack_100x64b", |b| {
        let stack = StackAllocator::production(MB).unwrap();

        b.iter(|| {
            let marker = stack.top();
            for _ in 0..100 {
                black_box(stack.alloc(64, 16));
            }
            stack.free_to_marker(marker);
        });
    });

    group.bench_function("pool_100x64b", |b| {
        let pool = PoolAllocator::production(64, 128).unwrap();

        b.iter(|| unsafe {
            let mut ptrs = Vec::with_capacity(100);
            for _ in 0..100 {
                ptrs.push(pool.alloc());
            }
            for ptr in ptrs {
                pool.free(ptr);
            }
        });
    });

    group.finish();
}

/// Benchmark different allocation sizes
fn bench_allocation_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocation_sizes");

    for size in [16, 64, 256, 1024, 4096].iter() {
        group.bench_with_input(BenchmarkId::new("stack", size), size, |b, &size| {
            let stack = StackAllocator::production(MB).unwrap();

            b.iter(|| {
                let ptr = stack.alloc(size, 8);
                stack.clear();
                black_box(ptr);
            });
        });

        group.bench_with_input(BenchmarkId::new("pool", size), size, |b, &size| {
            let pool = PoolAllocator::production(size, 64).unwrap();

            b.iter(|| unsafe {
                let ptr = pool.alloc();
                pool.free(ptr);
                black_box(ptr);
            });
        });
    }

    group.finish();
}

/// Benchmark the cost of debug fill patterns
fn bench_debug_painting(c: &mut Criterion) {
    let mut group = c.benchmark_group("debug_painting");

    group.bench_function("stack_production_256b", |b| {
        let stack = StackAllocator::production(MB).unwrap();
        b.iter(|| {
            black_box(stack.alloc(256, 16));
            stack.clear();
        });
    });

    group.bench_function("stack_debug_256b", |b| {
        let stack = StackAllocator::debug(MB).unwrap();
        b.iter(|| {
            black_box(stack.alloc(256, 16));
            stack.clear();
        });
    });

    group.bench_function("pool_debug_256b", |b| {
        let pool = PoolAllocator::debug(256, 64).unwrap();
        b.iter(|| unsafe {
            let ptr = pool.alloc();
            pool.free(ptr);
            black_box(ptr);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_allocation,
    bench_frame_allocations,
    bench_allocation_sizes,
    bench_debug_painting
);

criterion_main!(benches);
