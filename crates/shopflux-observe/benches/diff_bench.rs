//! Benchmarks for the selective snapshot diff.
//!
//! The indexed case is the one that matters: a storefront nav tree holds
//! hundreds of refinement entries and a typical transition touches one.
//!
//! Run with: cargo bench -p shopflux-observe --bench diff_bench

use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use shopflux_core::{IndexedState, StateValue};
use shopflux_observe::{ObserverNode, diff_snapshots};

fn collection(entries: usize) -> IndexedState {
    IndexedState::from_entries((0..entries).map(|i| {
        (
            format!("n{i}"),
            StateValue::map([(
                "selected",
                StateValue::list([StateValue::from(i as i64)]),
            )]),
        )
    }))
}

fn bench_indexed_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff/indexed");

    for entries in [100usize, 1000] {
        let nav = collection(entries);
        let old = StateValue::map([("nav", StateValue::Indexed(Rc::new(nav.clone())))]);
        let changed = nav.with_entry(
            "n0",
            StateValue::map([("selected", StateValue::list([StateValue::from(-1i64)]))]),
        );
        let new = StateValue::map([("nav", StateValue::Indexed(Rc::new(changed)))]);

        let fired = Rc::new(Cell::new(0usize));
        let f = Rc::clone(&fired);
        let tree = ObserverNode::branch([(
            "nav",
            ObserverNode::indexed(ObserverNode::leaf(move |_| f.set(f.get() + 1))),
        )]);

        group.bench_function(BenchmarkId::new("one_of", entries), |b| {
            b.iter(|| diff_snapshots(black_box(Some(&old)), black_box(Some(&new)), &tree));
        });
    }

    group.finish();
}

fn bench_unchanged_snapshot(c: &mut Criterion) {
    let nav = collection(1000);
    let state = StateValue::map([("nav", StateValue::Indexed(Rc::new(nav)))]);
    let tree = ObserverNode::branch([(
        "nav",
        ObserverNode::indexed(ObserverNode::leaf(|_| {})),
    )]);

    c.bench_function("diff/unchanged_1000", |b| {
        b.iter(|| diff_snapshots(black_box(Some(&state)), black_box(Some(&state.clone())), &tree));
    });
}

criterion_group!(benches, bench_indexed_diff, bench_unchanged_snapshot);
criterion_main!(benches);
