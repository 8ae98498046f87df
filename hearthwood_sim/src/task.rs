// Tasks and the shared task queue.
//
// A task is a unit of player-ordered work: chop the tree at a tile, or build
// a structure on a grass tile. Tasks wait in a FIFO `TaskQueue` until an idle
// agent claims one. Claiming (`TaskQueue::claim_nearest`) scans the whole
// queue, prunes every task whose tile no longer matches its kind (refunding
// build reservations), and hands out the valid task closest to the agent by
// Manhattan distance, ties broken by queue order.
//
// Build tasks have already paid for themselves: the cost was debited when
// the task was created (see `sim.rs` `enqueue_build`). Whoever drops a build
// task without completing it must refund `Task::reserved_wood`.
//
// Duplicate suppression (at most one task per tile, counting tasks that
// agents currently hold) lives in `sim.rs`, which can see both the queue and
// the agents.
//
// See also: `agent.rs` for how claimed tasks are carried out and abandoned.
//
// **Critical constraint: determinism.** The queue is a `Vec` in insertion
// order; scans and tie-breaks follow that order.

use crate::config::BuildCosts;
use crate::grid::Grid;
use crate::resources::Stockpile;
use crate::types::{BuildType, Position, TaskId, TileType};
use serde::{Deserialize, Serialize};

/// The kind of work a task represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskKind {
    /// Fell the tree at `position`. Valid while the tile is a tree.
    Chop { position: Position },
    /// Put `build_type` on `position`. Valid while the tile is grass.
    Build {
        position: Position,
        build_type: BuildType,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(flatten)]
    pub kind: TaskKind,
}

impl Task {
    pub fn position(&self) -> Position {
        match self.kind {
            TaskKind::Chop { position } | TaskKind::Build { position, .. } => position,
        }
    }

    pub fn build_type(&self) -> Option<BuildType> {
        match self.kind {
            TaskKind::Build { build_type, .. } => Some(build_type),
            TaskKind::Chop { .. } => None,
        }
    }

    pub fn is_chop(&self) -> bool {
        matches!(self.kind, TaskKind::Chop { .. })
    }

    /// Whether the task's tile still holds what the task needs.
    pub fn is_valid_on(&self, grid: &Grid) -> bool {
        let required = match self.kind {
            TaskKind::Chop { .. } => TileType::Tree,
            TaskKind::Build { .. } => TileType::Grass,
        };
        grid.is(self.position(), required)
    }

    /// Wood this task holds in reserve: the build cost, or nothing for a chop.
    pub fn reserved_wood(&self, costs: &BuildCosts) -> u32 {
        self.build_type().map_or(0, |b| costs.cost(b))
    }
}

/// FIFO queue of unclaimed tasks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskQueue {
    tasks: Vec<Task>,
}

impl TaskQueue {
    pub fn push(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Put a task back at the end of the queue.
    pub fn requeue(&mut self, task: Task) {
        self.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// The queued task targeting `pos`, if any.
    pub fn find_at(&self, pos: Position) -> Option<&Task> {
        self.tasks.iter().find(|t| t.position() == pos)
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.find_at(pos).is_some()
    }

    /// Drop every invalid task (refunding builds), then remove and return the
    /// valid task nearest to `from`.
    pub fn claim_nearest(
        &mut self,
        from: Position,
        grid: &Grid,
        stock: &mut Stockpile,
        costs: &BuildCosts,
    ) -> Option<Task> {
        self.prune_invalid(grid, stock, costs);
        let (index, _) = self
            .tasks
            .iter()
            .enumerate()
            .min_by_key(|(_, t)| from.manhattan_distance(t.position()))?;
        Some(self.tasks.remove(index))
    }

    /// Remove every task whose tile no longer matches its kind. Returns how
    /// many were dropped.
    pub fn prune_invalid(&mut self, grid: &Grid, stock: &mut Stockpile, costs: &BuildCosts) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| {
            if task.is_valid_on(grid) {
                return true;
            }
            let refund = task.reserved_wood(costs);
            stock.refund(refund);
            tracing::debug!(task = %task.id, position = %task.position(), refund, "pruned invalid task");
            false
        });
        before - self.tasks.len()
    }
}
