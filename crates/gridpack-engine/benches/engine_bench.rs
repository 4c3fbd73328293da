//! Benchmarks for placement search and checked moves.
//!
//! Run with: cargo bench -p gridpack-engine

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use gridpack_engine::{
    EngineConfig, GridEngine, GridRect, MoveOpts, NodeDescriptor, NodeId, NoopObserver,
    ResolvePolicy, placement,
};
use std::hint::black_box;
use std::sync::Arc;

fn id(raw: u64) -> NodeId {
    NodeId::new(raw).unwrap()
}

/// A `column`-wide grid with `n` auto-placed nodes of mixed sizes.
fn make_grid(column: u16, max_row: Option<u16>, n: u64, policy: ResolvePolicy) -> GridEngine {
    let mut config = EngineConfig::new(column).policy(policy);
    config.max_row = max_row;
    let mut engine = GridEngine::with_observer(config, Arc::new(NoopObserver)).unwrap();
    for raw in 1..=n {
        let w = 1 + (raw % 3) as u16;
        let h = 1 + (raw % 2) as u16;
        let _ = engine.add_node(NodeDescriptor::new(id(raw)).size(w, h).auto_position());
    }
    engine
}

fn bench_find_empty_slot(c: &mut Criterion) {
    let mut group = c.benchmark_group("placement/find_empty_slot");

    for n in [10u64, 50, 200] {
        let grid = make_grid(12, None, n, ResolvePolicy::Standard);
        let rects: Vec<GridRect> = grid.nodes().iter().map(|node| node.rect()).collect();
        group.bench_with_input(BenchmarkId::new("unbounded", n), &rects, |b, rects| {
            b.iter(|| black_box(placement::find_empty_slot(2, 2, rects, 12, 0, None)))
        });
    }

    group.finish();
}

fn bench_move_node(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/move_node");

    for n in [10u64, 50, 200] {
        group.bench_function(BenchmarkId::new("push_down", n), |b| {
            b.iter_batched(
                || {
                    let mut engine = make_grid(12, None, n, ResolvePolicy::Standard);
                    engine.clean_nodes();
                    engine
                },
                |mut engine| black_box(engine.move_node(id(n), MoveOpts::to(0, 0))),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_move_node_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/move_node_check");

    for (label, policy) in [
        ("standard", ResolvePolicy::Standard),
        ("cascade", ResolvePolicy::default()),
    ] {
        for n in [8u64, 24] {
            group.bench_function(BenchmarkId::new(label, n), |b| {
                b.iter_batched(
                    || make_grid(6, Some(8), n, policy),
                    |mut engine| black_box(engine.move_node_check_report(id(1), MoveOpts::resize(3, 3))),
                    BatchSize::SmallInput,
                )
            });
        }
    }

    group.finish();
}

fn bench_compact(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/compact");

    for n in [20u64, 100] {
        group.bench_function(BenchmarkId::new("float", n), |b| {
            b.iter_batched(
                || {
                    let mut engine = make_grid(12, None, n, ResolvePolicy::Standard);
                    engine.set_float(true);
                    for raw in (1..=n).step_by(3) {
                        engine.remove_node(id(raw));
                    }
                    engine
                },
                |mut engine| {
                    engine.compact();
                    black_box(engine.row_extent())
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_find_empty_slot,
    bench_move_node,
    bench_move_node_check,
    bench_compact,
);

criterion_main!(benches);
