// Test-only harness for end-to-end colony scenarios.
//
// Wraps a real `SimState` and drives it tick by tick through the same
// public API a UI or the headless driver uses. After every tick the harness
// checks the world-level invariants that must hold no matter what the
// player ordered:
//
// - tiles only change grass -> tree, tree -> grass, or grass -> structure;
// - no two pending tasks (queued or held by an agent) share a tile;
// - agents stay on the map and never stand on a wall;
// - an agent holds a task exactly when it is `Moving`;
// - `is_warm` agrees with the warm set;
// - wood is conserved: stockpile plus reserved build costs changes only by
//   chop yields (up) and completed builds (down).
//
// A violation panics with the tick number, so any scenario that runs ticks
// through the harness is also a property check.
//
// See also: `tests/scenarios.rs` for the scenarios themselves.

use hearthwood_sim::config::GameConfig;
use hearthwood_sim::event::Notification;
use hearthwood_sim::grid::Grid;
use hearthwood_sim::sim::SimState;
use hearthwood_sim::task::Task;
use hearthwood_sim::types::{AgentState, BuildType, Position, TileType};
use serde_json::Value;

pub struct ColonyHarness {
    pub sim: SimState,
}

impl ColonyHarness {
    /// A running sim on an ASCII layout with default config.
    pub fn from_layout(layout: &str, agents: &[(i32, i32)]) -> Self {
        Self::from_layout_with_config(layout, agents, GameConfig::default())
    }

    pub fn from_layout_with_config(layout: &str, agents: &[(i32, i32)], config: GameConfig) -> Self {
        let grid = Grid::parse(layout).expect("test layout should parse");
        let positions: Vec<Position> = agents.iter().map(|&(x, y)| Position::new(x, y)).collect();
        let mut sim = SimState::with_grid(0, config, grid, &positions);
        sim.start();
        Self { sim }
    }

    /// A running sim on a generated world.
    pub fn generated(seed: u64, config: GameConfig) -> Self {
        let mut sim = SimState::with_config(seed, config);
        sim.start();
        Self { sim }
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<TileType> {
        self.sim.world.grid.get(Position::new(x, y))
    }

    pub fn wood(&self) -> u32 {
        self.sim.wood()
    }

    /// Run `ticks` ticks, checking invariants after each. Returns every
    /// notification emitted.
    pub fn run(&mut self, ticks: u64) -> Vec<Notification> {
        let mut notifications = Vec::new();
        for _ in 0..ticks {
            notifications.extend(self.tick());
        }
        notifications
    }

    /// Run until `done` holds or `max_ticks` pass. Returns the tick at which
    /// `done` first held.
    pub fn run_until(&mut self, max_ticks: u64, done: impl Fn(&SimState) -> bool) -> Option<u64> {
        for _ in 0..max_ticks {
            if done(&self.sim) {
                return Some(self.sim.current_tick());
            }
            self.tick();
        }
        done(&self.sim).then(|| self.sim.current_tick())
    }

    /// One checked tick.
    pub fn tick(&mut self) -> Vec<Notification> {
        let before_grid = self.sim.world.grid.clone();
        let before_ledger = wood_ledger(&self.sim);
        let outcome = self.sim.tick();
        self.check_invariants(&before_grid, before_ledger);
        outcome.notifications
    }

    /// All pending tasks: the queue in order, then tasks held by agents.
    pub fn pending_tasks(&self) -> Vec<Task> {
        let world = &self.sim.world;
        world
            .tasks
            .iter()
            .copied()
            .chain(world.agents.iter().filter_map(|a| a.current_task))
            .collect()
    }

    pub fn snapshot_value(&self) -> Value {
        let json = self.sim.snapshot().to_json().expect("snapshot should serialize");
        serde_json::from_str(&json).expect("snapshot JSON should parse")
    }

    fn check_invariants(&self, before: &Grid, before_ledger: i64) {
        let sim = &self.sim;
        let world = &sim.world;
        let tick = world.tick;

        let mut chopped = 0i64;
        let mut built_cost = 0i64;
        for y in 0..world.grid.height() as i32 {
            for x in 0..world.grid.width() as i32 {
                let pos = Position::new(x, y);
                let (Some(old), Some(new)) = (before.get(pos), world.grid.get(pos)) else {
                    panic!("tick {tick}: grid dimensions changed");
                };
                match (old, new) {
                    _ if old == new => {}
                    (TileType::Grass, TileType::Tree) => {}
                    (TileType::Tree, TileType::Grass) => chopped += 1,
                    (TileType::Grass, structure) => {
                        let cost = BuildType::ALL
                            .into_iter()
                            .find(|b| b.tile() == structure)
                            .map(|b| sim.build_cost(b))
                            .unwrap_or_else(|| panic!("tick {tick}: grass became {structure:?}"));
                        built_cost += i64::from(cost);
                    }
                    _ => panic!("tick {tick}: illegal transition {old:?} -> {new:?} at {pos}"),
                }
            }
        }

        let mut seen: Vec<Position> = Vec::new();
        for task in self.pending_tasks() {
            let pos = task.position();
            assert!(!seen.contains(&pos), "tick {tick}: two pending tasks target {pos}");
            seen.push(pos);
        }

        for agent in &world.agents {
            assert!(
                world.grid.in_bounds(agent.position),
                "tick {tick}: {} left the map",
                agent.id
            );
            assert!(
                !world.grid.is_blocking(agent.position),
                "tick {tick}: {} stands on a wall at {}",
                agent.id,
                agent.position
            );
            assert_eq!(
                agent.current_task.is_some(),
                agent.state == AgentState::Moving,
                "tick {tick}: {} task/state mismatch ({:?})",
                agent.id,
                agent.state
            );
            assert_eq!(
                agent.is_warm,
                world.warmth.is_warm(agent.position),
                "tick {tick}: {} warmth flag is stale",
                agent.id
            );
        }

        let expected = before_ledger + chopped * i64::from(sim.config.chop_yield) - built_cost;
        assert_eq!(
            wood_ledger(sim),
            expected,
            "tick {tick}: wood not conserved (chopped {chopped}, built cost {built_cost})"
        );
    }
}

/// Stockpile plus every reservation still held by a pending build.
pub fn wood_ledger(sim: &SimState) -> i64 {
    let world = &sim.world;
    let reserved: u32 = world
        .tasks
        .iter()
        .copied()
        .chain(world.agents.iter().filter_map(|a| a.current_task))
        .map(|t| t.reserved_wood(&sim.config.build_costs))
        .sum();
    i64::from(world.stock.wood()) + i64::from(reserved)
}
