// Tick throughput on a large, busy colony.
//
// Builds a 200x150 world with three fireplaces and a full crew, queues a
// chop for every tree in a wide strip, then measures single ticks and the
// standalone BFS / warmth passes the tick leans on.

use criterion::{Criterion, criterion_group, criterion_main};
use hearthwood_sim::config::GameConfig;
use hearthwood_sim::grid::Grid;
use hearthwood_sim::pathfinding::find_next_step;
use hearthwood_sim::prng::GameRng;
use hearthwood_sim::sim::SimState;
use hearthwood_sim::types::{Position, TileType};
use hearthwood_sim::warmth::WarmMap;
use std::hint::black_box;

fn busy_sim() -> SimState {
    let mut config = GameConfig::default();
    config.spawn.max_workers = 16;
    config.spawn.chance = 1.0;
    config.initial_tree_density = 0.3;

    let mut grid = Grid::generate(200, 150, config.initial_tree_density, &mut GameRng::new(1));
    for x in [50, 100, 150] {
        grid.set(Position::new(x, 75), TileType::Fireplace);
    }
    let mut sim = SimState::with_grid(1, config, grid, &[Position::new(100, 74)]);
    sim.start();
    sim.enqueue_chop_area(Position::new(0, 40), Position::new(199, 110));
    // Let spawning fill the crew and spread them out.
    for _ in 0..200 {
        sim.tick();
    }
    sim
}

fn bench_tick(c: &mut Criterion) {
    let sim = busy_sim();
    c.bench_function("tick_busy_colony", |b| {
        b.iter_batched(
            || sim.clone(),
            |mut sim| black_box(sim.tick()),
            criterion::BatchSize::LargeInput,
        )
    });
}

fn bench_pathfinding(c: &mut Criterion) {
    let grid = Grid::generate(200, 150, 0.3, &mut GameRng::new(2));
    c.bench_function("find_next_step_cross_map", |b| {
        b.iter(|| {
            find_next_step(
                black_box(&grid),
                Position::new(0, 0),
                Position::new(199, 149),
            )
        })
    });
}

fn bench_warmth(c: &mut Criterion) {
    let mut grid = Grid::new(200, 150);
    for y in (10..150).step_by(20) {
        for x in (10..200).step_by(20) {
            grid.set(Position::new(x, y), TileType::Fireplace);
        }
    }
    c.bench_function("warmth_many_fireplaces", |b| {
        b.iter(|| WarmMap::compute(black_box(&grid), 5))
    });
}

criterion_group!(benches, bench_tick, bench_pathfinding, bench_warmth);
criterion_main!(benches);
