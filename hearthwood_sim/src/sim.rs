// Core simulation state and tick loop.
//
// `SimState` is the single source of truth for a Hearthwood colony. It owns
// the config, the PRNG, the running flag and build mode, and a `World`
// holding everything a tick changes: the tile grid, the agents, the task
// queue, the wood stockpile, the tick counter, the notification log, the
// warm set, and the id counters.
//
// ## Tick
//
// `tick()` is a no-op while paused. Otherwise it clones the world, computes
// the next state on the clone, and commits it by assignment:
//
//   1. Advance the tick counter.
//   2. Tree growth, when the counter is a multiple of
//      `growth.interval_ticks` (see `growth.rs`).
//   3. Worker spawning, when the counter is a multiple of
//      `spawn.interval_ticks` (see `spawn.rs`).
//   4. Agent updates in list order, each seeing the grid and queue as left
//      by the agents before it (see `agent.rs`).
//   5. Warm set recomputed from scratch; agents' `is_warm` copied from it
//      (see `warmth.rs`).
//
// ## Commands
//
// Player actions (`enqueue_chop`, `enqueue_build`, `designate_tile`, ...)
// run synchronously between ticks and work whether or not the sim is
// running. Invalid actions are silent no-ops; the `enqueue_*` methods return
// `Option<TaskId>` so callers can see whether the order was accepted. A tile
// counts as queued when a task in the queue or a task held by an agent
// targets it, so re-ordering a chop an agent is already walking to does
// nothing. Build orders pay their cost up front; see `task.rs` for refunds.
//
// `step()` drives the sim through a tick-sorted `SimCommand` list, the way
// scripted runs and integration tests use it.
//
// ## Snapshot
//
// `snapshot()` produces a read-only, serializable `Snapshot` for a UI or the
// headless driver. There is no load path.
//
// See also: `command.rs` for `SimAction`, `config.rs` for `GameConfig`,
// `event.rs` for notifications.
//
// **Critical constraint: determinism.** All randomness comes from
// `self.rng`, agents update in list order, and ids come from the world's
// counters. Same seed, same config and same commands give the same world.

use crate::agent::{Agent, AgentContext, AgentOutcome, exit_tile, update_agent};
use crate::command::{SimAction, SimCommand};
use crate::config::GameConfig;
use crate::event::{Notification, NotificationKind, NotificationLog};
use crate::grid::Grid;
use crate::growth::grow_trees;
use crate::resources::Stockpile;
use crate::spawn::pick_spawn_site;
use crate::task::{Task, TaskKind, TaskQueue};
use crate::types::{AgentId, AgentState, BuildType, IdCounters, Position, TaskId, TileType};
use crate::warmth::WarmMap;
use hearthwood_prng::GameRng;
use serde::{Deserialize, Serialize};

/// Everything a tick changes. Cloned at the start of a tick and committed
/// whole at the end.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// Ticks completed since the world was created.
    pub tick: u64,
    pub grid: Grid,
    /// All agents, in update order. Agents are never removed.
    pub agents: Vec<Agent>,
    pub tasks: TaskQueue,
    pub stock: Stockpile,
    pub notifications: NotificationLog,
    pub warmth: WarmMap,
    pub ids: IdCounters,
}

impl World {
    /// Stamp and record a notification, returning a copy for the caller.
    fn notify(&mut self, kind: NotificationKind, capacity: usize) -> Notification {
        let notification = Notification {
            id: self.ids.next_notification(),
            tick: self.tick,
            kind,
        };
        self.notifications.push(notification.clone(), capacity);
        notification
    }

    fn refresh_warmth(&mut self, radius: u32) {
        self.warmth = WarmMap::compute(&self.grid, radius);
        for agent in &mut self.agents {
            agent.is_warm = self.warmth.is_warm(agent.position);
        }
    }
}

/// Top-level simulation state.
#[derive(Clone, Debug)]
pub struct SimState {
    /// Game configuration (immutable after construction).
    pub config: GameConfig,
    /// The simulation's deterministic PRNG.
    pub rng: GameRng,
    /// Whether `tick()` advances the world.
    pub running: bool,
    /// Structure placed by `DesignateTile`, or `None` to chop.
    pub build_mode: Option<BuildType>,
    pub world: World,
}

/// What a single `tick()` produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Notifications emitted during the tick, oldest first.
    pub notifications: Vec<Notification>,
    pub trees_grown: u32,
}

/// The result of `step()`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepResult {
    pub ticks_run: u64,
    pub notifications: Vec<Notification>,
}

impl SimState {
    /// Create a new simulation with default config and the given seed.
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, GameConfig::default())
    }

    /// Create a new simulation and generate a world of `config.world_size`.
    pub fn with_config(seed: u64, config: GameConfig) -> Self {
        let (width, height) = config.world_size;
        let mut state = Self {
            config,
            rng: GameRng::new(seed),
            running: false,
            build_mode: None,
            world: World::default(),
        };
        state.initialize_game(width, height);
        state
    }

    /// Create a simulation on a prepared grid with agents at the given
    /// positions. Positions off the grid or on walls are skipped.
    pub fn with_grid(seed: u64, config: GameConfig, grid: Grid, agents: &[Position]) -> Self {
        let mut world = World {
            grid,
            stock: Stockpile::new(config.initial_wood),
            ..World::default()
        };
        for &position in agents {
            if world.grid.is_blocking(position) {
                tracing::warn!(%position, "agent position is off the map or on a wall, skipped");
                continue;
            }
            let id = world.ids.next_agent();
            world.agents.push(Agent::new(id, position));
        }
        world.refresh_warmth(config.warmth.radius);
        Self {
            config,
            rng: GameRng::new(seed),
            running: false,
            build_mode: None,
            world,
        }
    }

    /// Replace the world with a freshly generated one: forest at
    /// `initial_tree_density` and one worker on a cleared tile at the
    /// centre. Zero dimensions are raised to 1. The running flag is kept.
    pub fn initialize_game(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        let mut grid = Grid::generate(
            width,
            height,
            self.config.initial_tree_density,
            &mut self.rng,
        );
        let center = Position::new((width / 2) as i32, (height / 2) as i32);
        grid.set(center, TileType::Grass);

        let mut world = World {
            grid,
            stock: Stockpile::new(self.config.initial_wood),
            ..World::default()
        };
        let id = world.ids.next_agent();
        world.agents.push(Agent::new(id, center));
        world.refresh_warmth(self.config.warmth.radius);

        self.world = world;
        self.build_mode = None;
        tracing::info!(width, height, trees = self.world.grid.count(TileType::Tree), "game initialized");
    }

    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            tracing::info!(tick = self.world.tick, "simulation started");
        }
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            tracing::info!(tick = self.world.tick, "simulation stopped");
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the world by one tick. Does nothing while paused.
    pub fn tick(&mut self) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if !self.running {
            return outcome;
        }

        let config = &self.config;
        let capacity = config.notification_capacity;
        let mut next = self.world.clone();
        next.tick += 1;

        if is_due(next.tick, config.growth.interval_ticks) {
            let growth = grow_trees(&next.grid, &config.growth, &mut self.rng);
            next.grid = growth.grid;
            outcome.trees_grown = growth.trees_added;
            if growth.trees_added > 0 {
                let kind = NotificationKind::TreesGrew {
                    count: growth.trees_added,
                };
                outcome.notifications.push(next.notify(kind, capacity));
            }
        }

        if is_due(next.tick, config.spawn.interval_ticks) {
            let occupied: Vec<Position> = next.agents.iter().map(|a| a.position).collect();
            if let Some(position) =
                pick_spawn_site(&next.grid, &occupied, &config.spawn, &mut self.rng)
            {
                let agent_id = next.ids.next_agent();
                next.agents.push(Agent::new(agent_id, position));
                tracing::info!(agent = %agent_id, %position, "worker arrived");
                let kind = NotificationKind::WorkerArrived { agent_id, position };
                outcome.notifications.push(next.notify(kind, capacity));
            }
        }

        for index in 0..next.agents.len() {
            let mut ctx = AgentContext {
                grid: &mut next.grid,
                tasks: &mut next.tasks,
                stock: &mut next.stock,
                config,
            };
            let result = update_agent(&mut next.agents[index], &mut ctx);
            if let AgentOutcome::Built {
                position,
                build_type,
            } = result
            {
                tracing::info!(agent = %next.agents[index].id, %build_type, %position, "structure built");
                if build_type.tile().is_blocking() {
                    // Anyone else standing on the new wall moves with the builder.
                    if let Some(exit) = exit_tile(&next.grid, position) {
                        for other in next.agents.iter_mut().filter(|a| a.position == position) {
                            other.position = exit;
                        }
                    }
                }
                let kind = NotificationKind::Built {
                    build_type,
                    position,
                };
                outcome.notifications.push(next.notify(kind, capacity));
            }
        }

        next.refresh_warmth(config.warmth.radius);
        self.world = next;
        tracing::trace!(tick = self.world.tick, wood = self.world.stock.wood(), "tick committed");
        outcome
    }

    /// Run ticks up to `until_tick`, applying each command once the tick
    /// counter reaches its `tick`. `commands` must be sorted by tick.
    ///
    /// Stops early if the sim is (or becomes) paused; commands due at the
    /// tick where it stopped are still applied.
    pub fn step(&mut self, commands: &[SimCommand], until_tick: u64) -> StepResult {
        let mut result = StepResult::default();
        let mut pending = commands.iter().peekable();
        loop {
            while let Some(cmd) = pending.next_if(|c| c.tick <= self.world.tick) {
                self.apply_action(&cmd.action);
            }
            if self.world.tick >= until_tick || !self.running {
                break;
            }
            let outcome = self.tick();
            result.ticks_run += 1;
            result.notifications.extend(outcome.notifications);
        }
        result
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    pub fn apply_action(&mut self, action: &SimAction) {
        match *action {
            SimAction::Initialize { width, height } => self.initialize_game(width, height),
            SimAction::Start => self.start(),
            SimAction::Stop => self.stop(),
            SimAction::EnqueueChop { position } => {
                self.enqueue_chop(position);
            }
            SimAction::EnqueueChopArea { from, to } => {
                self.enqueue_chop_area(from, to);
            }
            SimAction::EnqueueBuild {
                position,
                build_type,
            } => {
                self.enqueue_build(position, build_type);
            }
            SimAction::SetBuildMode { build_type } => self.build_mode = build_type,
            SimAction::DesignateTile { position } => {
                self.designate_tile(position);
            }
        }
    }

    /// Order the tree at `position` chopped. No-op unless the tile is a tree
    /// and nothing already targets it.
    pub fn enqueue_chop(&mut self, position: Position) -> Option<TaskId> {
        if !self.world.grid.is(position, TileType::Tree) || self.is_task_queued(position) {
            return None;
        }
        let id = self.world.ids.next_task();
        self.world.tasks.push(Task {
            id,
            kind: TaskKind::Chop { position },
        });
        tracing::debug!(task = %id, %position, "chop queued");
        Some(id)
    }

    /// Order a chop for every tree in the rectangle spanned by `from` and
    /// `to` (inclusive, corners in either order), row-major. The rectangle
    /// is clipped to the grid first.
    pub fn enqueue_chop_area(&mut self, from: Position, to: Position) -> Vec<TaskId> {
        let max_x = self.world.grid.width() as i32 - 1;
        let max_y = self.world.grid.height() as i32 - 1;
        let (x0, x1) = (from.x.min(to.x).max(0), from.x.max(to.x).min(max_x));
        let (y0, y1) = (from.y.min(to.y).max(0), from.y.max(to.y).min(max_y));
        let mut queued = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                if let Some(id) = self.enqueue_chop(Position::new(x, y)) {
                    queued.push(id);
                }
            }
        }
        queued
    }

    /// Order `build_type` built on `position`, reserving its cost now. No-op
    /// unless the tile is grass, nothing already targets it, and the
    /// stockpile covers the cost.
    pub fn enqueue_build(&mut self, position: Position, build_type: BuildType) -> Option<TaskId> {
        if !self.world.grid.is(position, TileType::Grass) || self.is_task_queued(position) {
            return None;
        }
        let cost = self.build_cost(build_type);
        if !self.world.stock.try_debit(cost) {
            tracing::debug!(%build_type, cost, wood = self.world.stock.wood(), "cannot afford build");
            return None;
        }
        let id = self.world.ids.next_task();
        self.world.tasks.push(Task {
            id,
            kind: TaskKind::Build {
                position,
                build_type,
            },
        });
        tracing::debug!(task = %id, %build_type, %position, cost, "build queued");
        Some(id)
    }

    /// A player click: build in build mode, chop otherwise.
    pub fn designate_tile(&mut self, position: Position) -> Option<TaskId> {
        match self.build_mode {
            Some(build_type) => self.enqueue_build(position, build_type),
            None => self.enqueue_chop(position),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Whether a queued task or an agent's current task targets `position`.
    pub fn is_task_queued(&self, position: Position) -> bool {
        self.world.tasks.contains(position)
            || self
                .world
                .agents
                .iter()
                .any(|a| a.target() == Some(position))
    }

    /// The pending build task at `position`, queued or in progress.
    pub fn is_build_queued(&self, position: Position) -> Option<&Task> {
        self.world
            .tasks
            .iter()
            .chain(self.world.agents.iter().filter_map(|a| a.current_task.as_ref()))
            .find(|t| t.position() == position && t.build_type().is_some())
    }

    pub fn build_cost(&self, build_type: BuildType) -> u32 {
        self.config.build_costs.cost(build_type)
    }

    pub fn is_tile_warm(&self, position: Position) -> bool {
        self.world.warmth.is_warm(position)
    }

    pub fn wood(&self) -> u32 {
        self.world.stock.wood()
    }

    pub fn current_tick(&self) -> u64 {
        self.world.tick
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }
}

/// Whether a periodic system fires on `tick`. A zero interval never fires.
fn is_due(tick: u64, interval: u64) -> bool {
    interval != 0 && tick.is_multiple_of(interval)
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Read-only view of an agent for the UI.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub position: Position,
    pub state: AgentState,
    pub target: Option<Position>,
    pub task: Option<Task>,
    pub is_warm: bool,
}

/// A notification with its rendered message.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NotificationSnapshot {
    #[serde(flatten)]
    pub notification: Notification,
    pub message: String,
}

/// Everything a renderer needs to draw one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub running: bool,
    pub wood: u32,
    pub build_mode: Option<BuildType>,
    pub width: u32,
    pub height: u32,
    /// One string per row, in `Grid::render` glyphs.
    pub rows: Vec<String>,
    pub agents: Vec<AgentSnapshot>,
    pub tasks: Vec<Task>,
    pub notifications: Vec<NotificationSnapshot>,
    pub warm_tiles: Vec<Position>,
}

impl Snapshot {
    fn capture(sim: &SimState) -> Self {
        let world = &sim.world;
        Self {
            tick: world.tick,
            running: sim.running,
            wood: world.stock.wood(),
            build_mode: sim.build_mode,
            width: world.grid.width(),
            height: world.grid.height(),
            rows: world.grid.render().lines().map(str::to_owned).collect(),
            agents: world
                .agents
                .iter()
                .map(|a| AgentSnapshot {
                    id: a.id,
                    position: a.position,
                    state: a.state,
                    target: a.target(),
                    task: a.current_task,
                    is_warm: a.is_warm,
                })
                .collect(),
            tasks: world.tasks.iter().copied().collect(),
            notifications: world
                .notifications
                .iter()
                .map(|n| NotificationSnapshot {
                    notification: n.clone(),
                    message: n.message(),
                })
                .collect(),
            warm_tiles: world.warmth.positions(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
