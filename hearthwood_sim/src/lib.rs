// hearthwood_sim: pure Rust simulation library.
//
// This crate contains all simulation logic for Hearthwood: the tile grid,
// worker agents, the task queue, tree growth, fireplace warmth, worker
// spawning, and the tick orchestrator that sequences them. It does no I/O
// and knows nothing about rendering, so it can be tested, benchmarked, and
// run headless.
//
// Module overview:
// - `sim.rs`:         SimState, World, the tick loop, commands, queries, snapshots.
// - `grid.rs`:        Dense 2D tile grid, ASCII layouts, viewport sizing.
// - `pathfinding.rs`: BFS next-step search over the grid.
// - `agent.rs`:       Agent entity and its per-tick state machine.
// - `task.rs`:        Task / TaskKind and the FIFO TaskQueue (claim, prune, refund).
// - `resources.rs`:   The wood Stockpile.
// - `growth.rs`:      Probabilistic tree spread.
// - `warmth.rs`:      Bounded flood-fill from fireplaces.
// - `spawn.rs`:       Worker spawn site selection.
// - `event.rs`:       Player-facing notifications and the bounded log.
// - `command.rs`:     SimCommand / SimAction, every external mutation.
// - `config.rs`:      GameConfig, all tunable parameters.
// - `types.rs`:       Position, tile and structure enums, sequential ids.
// - `prng`:           Re-exported from `hearthwood_prng` (xoshiro256++ PRNG).
//
// **Critical constraint: determinism.** A sim is a pure function of its
// seed, its config, and the commands applied to it. All randomness comes from
// the seeded PRNG; no system time, no OS entropy, no hash-ordered iteration.

pub mod agent;
pub mod command;
pub mod config;
pub mod event;
pub mod grid;
pub mod growth;
pub mod pathfinding;
pub use hearthwood_prng as prng;
pub mod resources;
pub mod sim;
pub mod spawn;
pub mod task;
pub mod types;
pub mod warmth;
