//! Criterion benchmarks for the simulation core.
//!
//! Measures end-to-end firing throughput for representative nets. Run with:
//!
//!     cargo bench

use criterion::{criterion_group, criterion_main, Criterion};

use spn_simulator::{QueuePolicy, Simulator};

/// Two weighted immediate transitions competing over one cycling token:
/// exercises the priority buckets and the weighted random tie-break.
fn immediate_contention() -> Simulator {
    let mut sim = Simulator::with_seed("immediate_contention", 42);
    sim.add_type("t").unwrap();
    sim.add_place("s", "t", QueuePolicy::Fifo).unwrap();
    sim.add_place("g", "t", QueuePolicy::Fifo).unwrap();

    sim.add_immediate_transition("seed", 2, 1.0).unwrap();
    sim.add_inhibitor("seed guard", "g", "seed").unwrap();
    sim.add_constructor("seed mark", "seed", "g").unwrap();
    sim.add_constructor("seed fill", "seed", "s").unwrap();

    sim.add_immediate_transition("light", 1, 1.0).unwrap();
    sim.add_destructor("light take", "light", "s").unwrap();
    sim.add_constructor("light put", "light", "s").unwrap();

    sim.add_immediate_transition("heavy", 1, 3.0).unwrap();
    sim.add_destructor("heavy take", "heavy", "s").unwrap();
    sim.add_constructor("heavy put", "heavy", "s").unwrap();
    sim
}

/// A timed source feeding a queue drained by a timed server through an
/// immediate mover: exercises the deadline heap and token flow.
fn timed_chain() -> Simulator {
    let mut sim = Simulator::with_seed("timed_chain", 42);
    sim.add_type("job").unwrap();
    sim.add_place("q", "job", QueuePolicy::Fifo).unwrap();
    sim.add_place("r", "job", QueuePolicy::Fifo).unwrap();

    sim.add_timed_transition("source", |_| 1.0).unwrap();
    sim.add_constructor("produce", "source", "q").unwrap();
    sim.add_immediate_transition("move", 1, 1.0).unwrap();
    sim.add_transfer("shift", "move", "q", "r").unwrap();
    sim.add_timed_transition("sink", |_| 0.9).unwrap();
    sim.add_destructor("consume", "sink", "r").unwrap();
    sim
}

fn bench_firing_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("firing_throughput");

    let mut sim = immediate_contention();
    group.bench_function("immediate_contention_10k", |b| {
        b.iter(|| sim.fire_repeatedly(10_000).unwrap())
    });

    let mut sim = timed_chain();
    group.bench_function("timed_chain_10k", |b| {
        b.iter(|| sim.fire_repeatedly(10_000).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_firing_throughput);
criterion_main!(benches);
