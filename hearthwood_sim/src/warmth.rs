// Fireplace warmth.
//
// Warmth is recomputed from scratch every tick: for each fireplace a BFS
// bounded to `warmth.radius` steps floods outward over 4-connected
// neighbours, stopping at walls and doors. The union of all floods is the
// warm set. A fireplace tile is itself warm, and a door or wall is never
// entered (so never warm unless something else makes it so, which nothing
// does).
//
// The set is kept as a dense bitmap over the grid plus the sorted list of
// warm positions for snapshots.
//
// See also: `sim.rs`, which rebuilds the map after agent updates and copies
// each agent's `is_warm` flag from it.

use crate::grid::Grid;
use crate::types::{Position, TileType};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Which tiles are currently warm.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmMap {
    width: u32,
    warm: Vec<bool>,
}

impl WarmMap {
    /// Flood warmth from every fireplace on `grid`.
    pub fn compute(grid: &Grid, radius: u32) -> Self {
        let mut warm = vec![false; grid.area()];
        // Scratch distance buffer, reset per fireplace.
        let mut dist = vec![u32::MAX; grid.area()];
        let mut frontier = VecDeque::new();

        for fireplace in grid.positions_of(TileType::Fireplace) {
            let Some(start) = grid.index(fireplace) else {
                continue;
            };
            dist.fill(u32::MAX);
            dist[start] = 0;
            warm[start] = true;
            frontier.clear();
            frontier.push_back(fireplace);

            while let Some(current) = frontier.pop_front() {
                let Some(current_idx) = grid.index(current) else {
                    continue;
                };
                let d = dist[current_idx];
                if d >= radius {
                    continue;
                }
                for next in current.neighbors() {
                    let Some(next_idx) = grid.index(next) else {
                        continue;
                    };
                    if dist[next_idx] != u32::MAX {
                        continue;
                    }
                    if grid.get(next).is_none_or(TileType::blocks_warmth) {
                        continue;
                    }
                    dist[next_idx] = d + 1;
                    warm[next_idx] = true;
                    frontier.push_back(next);
                }
            }
        }

        Self {
            width: grid.width(),
            warm,
        }
    }

    pub fn is_warm(&self, pos: Position) -> bool {
        if pos.x < 0 || pos.y < 0 || pos.x as u32 >= self.width {
            return false;
        }
        let idx = pos.x as usize + pos.y as usize * self.width as usize;
        self.warm.get(idx).copied().unwrap_or(false)
    }

    /// Number of warm tiles.
    pub fn len(&self) -> usize {
        self.warm.iter().filter(|&&w| w).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.warm.contains(&true)
    }

    /// Warm positions in row-major order.
    pub fn positions(&self) -> Vec<Position> {
        let width = self.width.max(1) as usize;
        self.warm
            .iter()
            .enumerate()
            .filter(|&(_, &w)| w)
            .map(|(i, _)| Position::new((i % width) as i32, (i / width) as i32))
            .collect()
    }
}
