// Breadth-first pathfinding over the tile grid.
//
// Agents re-plan every tick: `find_next_step` runs a fresh BFS from the
// agent's tile to its target and returns only the first step. Nothing is
// cached, so a wall built mid-route is respected on the very next tick.
//
// The search is 4-connected and expands neighbours in the fixed order up,
// down, left, right (`Position::neighbors`), so among equally short paths the
// one discovered first wins. Identical grids always yield identical steps.
// Walls are impassable, except that the target tile itself is always
// enterable. Visited/parent bookkeeping lives in dense `Vec`s indexed by the
// grid's flat index (no hashing).
//
// See also: `agent.rs`, which calls this once per moving agent per tick and
// turns a `None` into task abandonment.
//
// **Critical constraint: determinism.** Pure function of grid, start and
// target.

use crate::grid::Grid;
use crate::types::Position;
use std::collections::VecDeque;

/// First step along a shortest path from `start` to `target`.
///
/// Returns `Some(start)` when already at the target and `None` when the
/// target is unreachable (or either end lies outside the grid).
pub fn find_next_step(grid: &Grid, start: Position, target: Position) -> Option<Position> {
    if start == target {
        return Some(start);
    }
    let start_idx = grid.index(start)?;
    let target_idx = grid.index(target)?;

    // parent[i] = flat index we came from; usize::MAX = unvisited.
    let mut parent = vec![usize::MAX; grid.area()];
    parent[start_idx] = start_idx;

    let mut frontier = VecDeque::new();
    frontier.push_back(start);

    while let Some(current) = frontier.pop_front() {
        let Some(current_idx) = grid.index(current) else {
            continue;
        };
        for next in current.neighbors() {
            let Some(next_idx) = grid.index(next) else {
                continue;
            };
            if parent[next_idx] != usize::MAX {
                continue;
            }
            if next != target && grid.is_blocking(next) {
                continue;
            }
            parent[next_idx] = current_idx;
            if next_idx == target_idx {
                return Some(first_step(grid, &parent, start_idx, target_idx));
            }
            frontier.push_back(next);
        }
    }

    None
}

/// Walk parents back from the target until the node whose parent is the start.
fn first_step(grid: &Grid, parent: &[usize], start_idx: usize, target_idx: usize) -> Position {
    let mut step = target_idx;
    while parent[step] != start_idx {
        step = parent[step];
    }
    let width = grid.width() as usize;
    Position::new((step % width) as i32, (step / width) as i32)
}
