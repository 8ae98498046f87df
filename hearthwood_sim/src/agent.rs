// Worker agents and their per-tick state machine.
//
// An agent cycles idle -> moving -> {chopping | building} -> idle. Each tick
// `update_agent` advances one agent by exactly one of:
//
// - **Idle** (no task): ask the queue for the nearest valid task. Claiming
//   is the whole action for that tick; the agent starts walking next tick.
// - **Moving**: if already on the target tile, work. Otherwise take one BFS
//   step (`pathfinding::find_next_step`), then work if that step arrived.
//   No path means the task is abandoned: chops go back to the end of the
//   queue, builds are refunded and dropped.
// - **Work** (arrival tick only): a chop turns the tree to grass and credits
//   `chop_yield`; a build places the structure. Either way the task is
//   cleared and the agent shows `Chopping`/`Building` for this one tick. A
//   task whose tile no longer matches (a tree grew on the build site, a tree
//   was already felled) is dropped with its reservation refunded.
//
// An agent's target is not stored separately: it is the position of its
// current task, so "has a task" and "has a target" can never disagree.
//
// Walls are the only blocking tile and a wall is built on the builder's own
// tile, so after building one the agent steps to the first non-blocking
// neighbour (up, down, left, right). A wall order whose tile has no such
// neighbour is dropped and refunded instead of boxing the builder in.
//
// See also: `task.rs` for claiming and pruning, `sim.rs` which runs this for
// every agent in list order against the grid as mutated so far.
//
// **Critical constraint: determinism.** No randomness here; outcomes depend
// only on the grid, queue, and agent order.

use crate::config::GameConfig;
use crate::grid::Grid;
use crate::pathfinding::find_next_step;
use crate::resources::Stockpile;
use crate::task::{Task, TaskKind, TaskQueue};
use crate::types::{AgentId, AgentState, BuildType, Position, TaskId, TileType};
use serde::{Deserialize, Serialize};

/// A worker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub position: Position,
    pub state: AgentState,
    pub current_task: Option<Task>,
    /// Whether the agent stands on a warm tile. Recomputed every tick.
    pub is_warm: bool,
}

impl Agent {
    pub fn new(id: AgentId, position: Position) -> Self {
        Self {
            id,
            position,
            state: AgentState::Idle,
            current_task: None,
            is_warm: false,
        }
    }

    /// The tile the agent is heading to: its task's position.
    pub fn target(&self) -> Option<Position> {
        self.current_task.as_ref().map(Task::position)
    }
}

/// What happened to an agent during its update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentOutcome {
    /// No task and none available.
    Idle,
    /// Claimed a task from the queue.
    Assigned(TaskId),
    /// Took one step toward its target.
    Moved,
    Chopped { position: Position },
    Built {
        position: Position,
        build_type: BuildType,
    },
    /// Gave up a task it could not reach.
    Abandoned(TaskId),
    /// Discarded a task whose tile no longer matched its kind.
    Dropped(TaskId),
}

/// Mutable world pieces an agent update reads and writes.
pub struct AgentContext<'a> {
    pub grid: &'a mut Grid,
    pub tasks: &'a mut TaskQueue,
    pub stock: &'a mut Stockpile,
    pub config: &'a GameConfig,
}

/// The first non-blocking neighbour of `pos`, in up, down, left, right order.
pub fn exit_tile(grid: &Grid, pos: Position) -> Option<Position> {
    pos.neighbors().into_iter().find(|&n| !grid.is_blocking(n))
}

/// Advance one agent by one tick.
pub fn update_agent(agent: &mut Agent, ctx: &mut AgentContext<'_>) -> AgentOutcome {
    let Some(task) = agent.current_task else {
        agent.state = AgentState::Idle;
        let claimed = ctx.tasks.claim_nearest(
            agent.position,
            ctx.grid,
            ctx.stock,
            &ctx.config.build_costs,
        );
        return match claimed {
            Some(task) => {
                tracing::debug!(agent = %agent.id, task = %task.id, target = %task.position(), "task assigned");
                agent.current_task = Some(task);
                agent.state = AgentState::Moving;
                AgentOutcome::Assigned(task.id)
            }
            None => AgentOutcome::Idle,
        };
    };

    let target = task.position();
    if agent.position == target {
        return work(agent, task, ctx);
    }

    let Some(next) = find_next_step(ctx.grid, agent.position, target) else {
        return abandon(agent, task, ctx);
    };
    if ctx.grid.is_blocking(next) {
        // Only the target itself can be a wall here, and a walled target can
        // never match its task.
        return drop_task(agent, task, ctx);
    }

    agent.position = next;
    agent.state = AgentState::Moving;
    if agent.position == target {
        return work(agent, task, ctx);
    }
    AgentOutcome::Moved
}

fn work(agent: &mut Agent, task: Task, ctx: &mut AgentContext<'_>) -> AgentOutcome {
    if !task.is_valid_on(ctx.grid) {
        return drop_task(agent, task, ctx);
    }
    match task.kind {
        TaskKind::Chop { position } => {
            ctx.grid.set(position, TileType::Grass);
            ctx.stock.credit(ctx.config.chop_yield);
            agent.current_task = None;
            agent.state = AgentState::Chopping;
            AgentOutcome::Chopped { position }
        }
        TaskKind::Build {
            position,
            build_type,
        } => {
            let tile = build_type.tile();
            let exit = if tile.is_blocking() {
                match exit_tile(ctx.grid, position) {
                    Some(exit) => Some(exit),
                    None => return drop_task(agent, task, ctx),
                }
            } else {
                None
            };
            ctx.grid.set(position, tile);
            if let Some(exit) = exit {
                agent.position = exit;
            }
            agent.current_task = None;
            agent.state = AgentState::Building;
            AgentOutcome::Built {
                position,
                build_type,
            }
        }
    }
}

fn abandon(agent: &mut Agent, task: Task, ctx: &mut AgentContext<'_>) -> AgentOutcome {
    agent.current_task = None;
    agent.state = AgentState::Idle;
    if task.is_chop() {
        ctx.tasks.requeue(task);
    } else {
        ctx.stock.refund(task.reserved_wood(&ctx.config.build_costs));
    }
    tracing::debug!(agent = %agent.id, task = %task.id, target = %task.position(), "no path, task abandoned");
    AgentOutcome::Abandoned(task.id)
}

fn drop_task(agent: &mut Agent, task: Task, ctx: &mut AgentContext<'_>) -> AgentOutcome {
    agent.current_task = None;
    agent.state = AgentState::Idle;
    let refund = task.reserved_wood(&ctx.config.build_costs);
    ctx.stock.refund(refund);
    tracing::debug!(agent = %agent.id, task = %task.id, refund, "task no longer matches its tile, dropped");
    AgentOutcome::Dropped(task.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        grid: Grid,
        tasks: TaskQueue,
        stock: Stockpile,
        config: GameConfig,
    }

    impl Fixture {
        fn new(layout: &str) -> Self {
            Self {
                grid: Grid::parse(layout).unwrap(),
                tasks: TaskQueue::default(),
                stock: Stockpile::default(),
                config: GameConfig::default(),
            }
        }

        fn update(&mut self, agent: &mut Agent) -> AgentOutcome {
            let mut ctx = AgentContext {
                grid: &mut self.grid,
                tasks: &mut self.tasks,
                stock: &mut self.stock,
                config: &self.config,
            };
            update_agent(agent, &mut ctx)
        }
    }

    fn chop_at(id: u64, x: i32, y: i32) -> Task {
        Task {
            id: TaskId(id),
            kind: TaskKind::Chop {
                position: Position::new(x, y),
            },
        }
    }

    fn build_at(id: u64, x: i32, y: i32, build_type: BuildType) -> Task {
        Task {
            id: TaskId(id),
            kind: TaskKind::Build {
                position: Position::new(x, y),
                build_type,
            },
        }
    }

    #[test]
    fn target_is_derived_from_task() {
        let mut agent = Agent::new(AgentId(0), Position::new(0, 0));
        assert_eq!(agent.target(), None);
        agent.current_task = Some(chop_at(0, 3, 1));
        assert_eq!(agent.target(), Some(Position::new(3, 1)));
    }

    #[test]
    fn idle_agent_claims_then_walks_then_chops() {
        let mut fx = Fixture::new("...T");
        fx.tasks.push(chop_at(0, 3, 0));
        let mut agent = Agent::new(AgentId(0), Position::new(0, 0));

        assert_eq!(fx.update(&mut agent), AgentOutcome::Assigned(TaskId(0)));
        assert_eq!(agent.position, Position::new(0, 0), "claiming is the whole tick");
        assert_eq!(agent.state, AgentState::Moving);
        assert!(fx.tasks.is_empty());

        assert_eq!(fx.update(&mut agent), AgentOutcome::Moved);
        assert_eq!(fx.update(&mut agent), AgentOutcome::Moved);
        assert_eq!(
            fx.update(&mut agent),
            AgentOutcome::Chopped {
                position: Position::new(3, 0)
            }
        );
        assert_eq!(agent.state, AgentState::Chopping);
        assert_eq!(agent.target(), None);
        assert!(fx.grid.is(Position::new(3, 0), TileType::Grass));
        assert_eq!(fx.stock.wood(), 1);

        assert_eq!(fx.update(&mut agent), AgentOutcome::Idle);
        assert_eq!(agent.state, AgentState::Idle, "display state lasts one tick");
    }

    #[test]
    fn agent_assigned_on_its_target_works_next_tick() {
        let mut fx = Fixture::new("...");
        fx.stock = Stockpile::new(3);
        fx.tasks.push(build_at(0, 1, 0, BuildType::Bed));
        let mut agent = Agent::new(AgentId(0), Position::new(1, 0));

        assert_eq!(fx.update(&mut agent), AgentOutcome::Assigned(TaskId(0)));
        assert_eq!(
            fx.update(&mut agent),
            AgentOutcome::Built {
                position: Position::new(1, 0),
                build_type: BuildType::Bed
            }
        );
        assert!(fx.grid.is(Position::new(1, 0), TileType::Bed));
        assert_eq!(agent.position, Position::new(1, 0), "beds do not block");
        assert_eq!(fx.stock.wood(), 3, "build cost was paid at enqueue time");
    }

    #[test]
    fn building_a_wall_steps_the_builder_off() {
        let mut fx = Fixture::new(
            "
            ...
            ...
            ...
            ",
        );
        let mut agent = Agent::new(AgentId(0), Position::new(1, 1));
        agent.current_task = Some(build_at(0, 1, 1, BuildType::Wall));

        let outcome = fx.update(&mut agent);
        assert!(matches!(outcome, AgentOutcome::Built { .. }));
        assert!(fx.grid.is(Position::new(1, 1), TileType::Wall));
        assert_eq!(agent.position, Position::new(1, 0), "first open neighbour is up");
        assert!(!fx.grid.is_blocking(agent.position));
    }

    #[test]
    fn wall_with_no_exit_is_dropped_and_refunded() {
        let mut fx = Fixture::new(
            "
            .#.
            #.#
            .#.
            ",
        );
        let mut agent = Agent::new(AgentId(0), Position::new(1, 1));
        agent.current_task = Some(build_at(4, 1, 1, BuildType::Wall));

        assert_eq!(fx.update(&mut agent), AgentOutcome::Dropped(TaskId(4)));
        assert!(fx.grid.is(Position::new(1, 1), TileType::Grass));
        assert_eq!(fx.stock.wood(), fx.config.build_costs.wall);
        assert_eq!(agent.state, AgentState::Idle);
    }

    #[test]
    fn unreachable_chop_is_requeued() {
        let mut fx = Fixture::new(
            "
            ..#.
            ..#T
            ..#.
            ",
        );
        let mut agent = Agent::new(AgentId(0), Position::new(0, 0));
        agent.current_task = Some(chop_at(2, 3, 1));
        agent.state = AgentState::Moving;

        assert_eq!(fx.update(&mut agent), AgentOutcome::Abandoned(TaskId(2)));
        assert_eq!(agent.target(), None);
        assert_eq!(agent.state, AgentState::Idle);
        let queued: Vec<TaskId> = fx.tasks.iter().map(|t| t.id).collect();
        assert_eq!(queued, vec![TaskId(2)], "chop goes back on the queue");
    }

    #[test]
    fn unreachable_build_is_refunded_and_dropped() {
        let mut fx = Fixture::new(
            "
            ..#.
            ..#.
            ..#.
            ",
        );
        let mut agent = Agent::new(AgentId(0), Position::new(0, 0));
        agent.current_task = Some(build_at(5, 3, 1, BuildType::Fireplace));

        assert_eq!(fx.update(&mut agent), AgentOutcome::Abandoned(TaskId(5)));
        assert!(fx.tasks.is_empty());
        assert_eq!(fx.stock.wood(), fx.config.build_costs.fireplace);
    }

    #[test]
    fn tree_grown_on_build_site_drops_task_on_arrival() {
        let mut fx = Fixture::new(".T");
        let mut agent = Agent::new(AgentId(0), Position::new(0, 0));
        agent.current_task = Some(build_at(1, 1, 0, BuildType::Door));

        assert_eq!(fx.update(&mut agent), AgentOutcome::Dropped(TaskId(1)));
        assert_eq!(agent.position, Position::new(1, 0));
        assert!(fx.grid.is(Position::new(1, 0), TileType::Tree));
        assert_eq!(fx.stock.wood(), fx.config.build_costs.door);
    }

    #[test]
    fn chop_yield_comes_from_config() {
        let mut fx = Fixture::new("T");
        fx.config.chop_yield = 5;
        let mut agent = Agent::new(AgentId(0), Position::new(0, 0));
        agent.current_task = Some(chop_at(0, 0, 0));
        fx.update(&mut agent);
        assert_eq!(fx.stock.wood(), 5);
    }

    #[test]
    fn exit_tile_prefers_up_down_left_right() {
        let grid = Grid::parse(
            "
            .#.
            #..
            ...
            ",
        )
        .unwrap();
        assert_eq!(exit_tile(&grid, Position::new(1, 1)), Some(Position::new(1, 2)));
        assert_eq!(exit_tile(&grid, Position::new(0, 0)), None);
    }
}
