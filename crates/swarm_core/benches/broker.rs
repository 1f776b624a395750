//! Broker and targeting benchmarks for swarm_core.
//!
//! Run with: `cargo bench -p swarm_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use swarm_core::broker::{BrokerPolicy, TaskBroker};
use swarm_core::grid::GridPos;
use swarm_core::roster::{Roster, Unit};
use swarm_core::targeting::TargetingState;
use swarm_core::task::GlobalCommand;

/// One assignment round with a large idle workforce and a deep queue.
pub fn broker_benchmark(c: &mut Criterion) {
    c.bench_function("broker_advance_1000_workers", |b| {
        b.iter_with_setup(
            || {
                let mut roster = Roster::new();
                for id in 0..1000 {
                    roster.insert_live(Unit::worker(id));
                }
                let mut broker = TaskBroker::new(BrokerPolicy::default());
                for i in 0..100 {
                    broker.enqueue_at(
                        GlobalCommand::ConstructFactory,
                        GridPos::new(i, i),
                        8,
                    );
                }
                (broker, roster)
            },
            |(mut broker, mut roster)| {
                broker.advance(&mut roster);
                black_box(broker.len())
            },
        )
    });
}

/// Rally pushes against a deep stack of distant sightings.
pub fn targeting_benchmark(c: &mut Criterion) {
    c.bench_function("rally_push_deep_stack", |b| {
        b.iter_with_setup(
            || {
                let mut state = TargetingState::new();
                for i in 0..500 {
                    state.push_rally(GridPos::new(i * 20, 0), 64);
                }
                state
            },
            |mut state| {
                black_box(state.push_rally(GridPos::new(-5_000, -5_000), 64))
            },
        )
    });
}

criterion_group!(benches, broker_benchmark, targeting_benchmark);
criterion_main!(benches);
