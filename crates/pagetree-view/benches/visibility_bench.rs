//! Benchmarks for the visibility projection.
//!
//! Run with: cargo bench -p pagetree-view

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use pagetree_core::{NodeId, NodeSet, TreeNode};
use pagetree_view::VisibilityProjection;
use std::hint::black_box;

/// Build one complete tree with `fanout` children per node, `depth` levels deep.
fn make_tree(fanout: usize, depth: u32) -> NodeSet {
    fn build(
        level: u32,
        depth: u32,
        fanout: usize,
        next_id: &mut u64,
        counter: &mut u64,
        out: &mut Vec<TreeNode>,
    ) {
        let id = *next_id;
        *next_id += 1;
        let lft = *counter;
        *counter += 1;
        let slot = out.len();
        out.push(TreeNode::new(id, 1, level, lft, 0));
        if level < depth {
            for _ in 0..fanout {
                build(level + 1, depth, fanout, next_id, counter, out);
            }
        }
        out[slot].rght = *counter;
        *counter += 1;
    }

    let mut out = Vec::new();
    build(0, depth, fanout, &mut 1, &mut 1, &mut out);
    NodeSet::from_nodes(out).expect("generated tree is valid")
}

fn bench_toggle_root(c: &mut Criterion) {
    let mut group = c.benchmark_group("visibility/toggle_root");

    for (fanout, depth) in [(4, 3), (6, 4), (8, 4)] {
        let nodes = make_tree(fanout, depth);
        group.bench_with_input(
            BenchmarkId::new("collapse_open_tree", nodes.len()),
            &nodes,
            |b, nodes| {
                b.iter_batched(
                    || VisibilityProjection::new(nodes, depth + 1),
                    |mut projection| black_box(projection.toggle(nodes, NodeId::new(1))),
                    BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

fn bench_visible_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("visibility/visible_rows");

    for expand in [1, 2, 4] {
        let nodes = make_tree(8, 4);
        let projection = VisibilityProjection::new(&nodes, expand);
        group.bench_with_input(BenchmarkId::new("depth", expand), &nodes, |b, nodes| {
            b.iter(|| black_box(projection.visible_rows(nodes)))
        });
    }

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let nodes = make_tree(8, 4);
    c.bench_function("visibility/reconcile", |b| {
        b.iter_batched(
            || VisibilityProjection::new(&nodes, 2),
            |mut projection| black_box(projection.reconcile(&nodes)),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_toggle_root, bench_visible_rows, bench_reconcile);
criterion_main!(benches);
