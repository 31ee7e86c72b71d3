use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use arena_core::arena::{spawn_crowd, spawn_duel, DEFAULT_RADIUS, DEFAULT_SEPARATION};
use arena_core::balance::bout_seed;
use arena_core::{SimConfig, Simulation};

fn duel() -> Simulation {
    let mut sim = Simulation::new(SimConfig::default()).unwrap();
    spawn_duel(sim.world_mut(), DEFAULT_SEPARATION, DEFAULT_RADIUS).unwrap();
    sim
}

fn crowd(count: usize) -> Simulation {
    let config = SimConfig {
        record_journal: false,
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config).unwrap();
    spawn_crowd(sim.world_mut(), count, 6.0, 0.8).unwrap();
    sim
}

fn bench_duel(c: &mut Criterion) {
    c.bench_function("duel_100_ticks", |b| {
        b.iter_batched(
            duel,
            |mut sim| {
                sim.run(black_box(100)).unwrap();
                sim
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("duel_bout", |b| {
        b.iter_batched(duel, |mut sim| sim.run_bout().unwrap(), BatchSize::SmallInput)
    });
}

fn bench_crowd(c: &mut Criterion) {
    for count in [16usize, 64] {
        c.bench_function(&format!("crowd_{count}_tick"), |b| {
            b.iter_batched(
                || crowd(count),
                |mut sim| {
                    sim.step().unwrap();
                    sim
                },
                BatchSize::SmallInput,
            )
        });
    }
}

fn bench_seeds(c: &mut Criterion) {
    c.bench_function("bout_seed", |b| {
        b.iter(|| bout_seed(black_box(42), black_box(7)))
    });
}

criterion_group!(benches, bench_duel, bench_crowd, bench_seeds);
criterion_main!(benches);
