// Worker spawning.
//
// New workers arrive at fireplaces. Every `spawn.interval_ticks` the
// orchestrator asks `pick_spawn_site` for a tile: once the population has
// reached `spawn.max_workers` the check is skipped without drawing any
// randomness. Otherwise it rolls `spawn.chance`, picks one fireplace
// uniformly, and picks uniformly among the grass tiles in the Chebyshev
// square of `spawn.radius` around it that no agent stands on. No fireplace
// or no free tile means no spawn this time.
//
// This module only chooses the site. Creating the agent (id allocation,
// notification) happens in `sim.rs`.

use crate::config::SpawnParams;
use crate::grid::Grid;
use crate::types::{Position, TileType};
use hearthwood_prng::GameRng;
use smallvec::SmallVec;

/// Choose where a new worker appears, if one does.
///
/// `occupied` holds the positions of every existing agent; its length is the
/// current population.
pub fn pick_spawn_site(
    grid: &Grid,
    occupied: &[Position],
    params: &SpawnParams,
    rng: &mut GameRng,
) -> Option<Position> {
    if occupied.len() >= params.max_workers {
        return None;
    }
    if !rng.chance(params.chance) {
        return None;
    }

    let fireplaces: Vec<Position> = grid.positions_of(TileType::Fireplace).collect();
    let &fireplace = rng.choose(&fireplaces)?;

    let candidates: SmallVec<[Position; 24]> = grid
        .square_around(fireplace, params.radius)
        .filter(|&pos| grid.is(pos, TileType::Grass) && !occupied.contains(&pos))
        .collect();
    rng.choose(&candidates).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always() -> SpawnParams {
        SpawnParams {
            chance: 1.0,
            ..SpawnParams::default()
        }
    }

    #[test]
    fn no_fireplace_no_spawn() {
        let grid = Grid::new(5, 5);
        assert_eq!(
            pick_spawn_site(&grid, &[], &always(), &mut GameRng::new(1)),
            None
        );
    }

    #[test]
    fn spawns_on_free_grass_near_fireplace() {
        let grid = Grid::parse(
            "
            .......
            .......
            ...F...
            .......
            .......
            ",
        )
        .unwrap();
        let fireplace = Position::new(3, 2);
        let occupied = [Position::new(2, 2)];
        for seed in 0..50 {
            let site = pick_spawn_site(&grid, &occupied, &always(), &mut GameRng::new(seed))
                .expect("chance 1.0 with free tiles always spawns");
            assert!((site.x - fireplace.x).abs() <= 2 && (site.y - fireplace.y).abs() <= 2);
            assert!(grid.is(site, TileType::Grass));
            assert_ne!(site, Position::new(2, 2), "occupied tile is never chosen");
        }
    }

    #[test]
    fn population_cap_blocks_spawn() {
        let grid = Grid::parse("..F..").unwrap();
        let occupied = [Position::new(0, 0), Position::new(4, 0)];
        assert_eq!(
            pick_spawn_site(&grid, &occupied, &always(), &mut GameRng::new(2)),
            None
        );
    }

    #[test]
    fn capped_check_draws_no_randomness() {
        let grid = Grid::parse("..F..").unwrap();
        let occupied = [Position::new(0, 0), Position::new(4, 0)];
        let mut rng = GameRng::new(3);
        let before = rng.clone();
        pick_spawn_site(&grid, &occupied, &always(), &mut rng);
        assert_eq!(rng, before);
    }

    #[test]
    fn fully_enclosed_fireplace_has_no_candidates() {
        let grid = Grid::parse(
            "
            TTTTT
            T###T
            T#F#T
            T###T
            TTTTT
            ",
        )
        .unwrap();
        assert_eq!(
            pick_spawn_site(&grid, &[], &always(), &mut GameRng::new(4)),
            None
        );
    }

    #[test]
    fn zero_chance_never_spawns() {
        let grid = Grid::parse("..F..").unwrap();
        let params = SpawnParams {
            chance: 0.0,
            ..SpawnParams::default()
        };
        let mut rng = GameRng::new(5);
        for _ in 0..100 {
            assert_eq!(pick_spawn_site(&grid, &[], &params, &mut rng), None);
        }
    }
}
