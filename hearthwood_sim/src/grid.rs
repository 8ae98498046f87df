// Dense 2D tile grid: the world's spatial truth.
//
// Tiles are stored row-major in a flat `Vec<TileType>` indexed by
// `x + y * width`, giving O(1) reads and writes. Every access is
// bounds-checked: out-of-bounds reads return `None` and count as blocking,
// out-of-bounds writes are no-ops. Malformed external coordinates therefore
// never panic.
//
// The grid is `Clone` and small (one byte per tile), so the tick orchestrator
// computes each tick against a cloned copy and commits it whole. Tree growth
// likewise applies its nominations to a fresh copy.
//
// Also provides ASCII layout parsing/rendering for tests, scenario files and
// the headless driver, and `GridSize::from_viewport` for the UI to derive
// dimensions from its canvas.
//
// See also: `pathfinding.rs` and `warmth.rs`, which search this grid,
// `growth.rs` for tree spread, `sim.rs` which owns the grid inside `World`.

use crate::types::{Position, TileType};
use hearthwood_prng::GameRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Grid dimensions in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// How many whole tiles fit in a viewport of the given pixel size.
    /// Never smaller than 1×1 so a collapsed canvas still yields a valid grid.
    pub fn from_viewport(width_px: u32, height_px: u32, tile_px: u32) -> Self {
        let tile_px = tile_px.max(1);
        Self {
            width: (width_px / tile_px).max(1),
            height: (height_px / tile_px).max(1),
        }
    }
}

/// Errors from `Grid::parse`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridParseError {
    #[error("layout contains no rows")]
    Empty,
    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown tile glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph {
        row: usize,
        column: usize,
        glyph: char,
    },
}

/// Dense row-major tile grid.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<TileType>,
}

impl Grid {
    /// An all-grass grid.
    pub fn new(width: u32, height: u32) -> Self {
        let total = (width as usize) * (height as usize);
        Self {
            width,
            height,
            tiles: vec![TileType::Grass; total],
        }
    }

    /// A fresh map for a new game: grass with trees scattered at
    /// `tree_density` (each tile rolls independently, in row-major order).
    pub fn generate(width: u32, height: u32, tree_density: f64, rng: &mut GameRng) -> Self {
        let mut grid = Self::new(width, height);
        for tile in &mut grid.tiles {
            if rng.chance(tree_density) {
                *tile = TileType::Tree;
            }
        }
        grid
    }

    /// Parse an ASCII layout, one line per row (see `TileType::glyph`).
    /// Blank lines and surrounding whitespace are ignored.
    pub fn parse(layout: &str) -> Result<Self, GridParseError> {
        let rows: Vec<&str> = layout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let Some(first) = rows.first() else {
            return Err(GridParseError::Empty);
        };
        let width = first.chars().count();

        let mut tiles = Vec::with_capacity(width * rows.len());
        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(GridParseError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }
            for (column, glyph) in line.chars().enumerate() {
                let tile = TileType::from_glyph(glyph).ok_or(GridParseError::UnknownGlyph {
                    row,
                    column,
                    glyph,
                })?;
                tiles.push(tile);
            }
        }

        Ok(Self {
            width: width as u32,
            height: rows.len() as u32,
            tiles,
        })
    }

    /// Render back to the ASCII layout accepted by `parse`.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.tiles.len() + self.height as usize);
        for row in self.tiles.chunks(self.width.max(1) as usize) {
            out.extend(row.iter().map(|t| t.glyph()));
            out.push('\n');
        }
        out
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> GridSize {
        GridSize::new(self.width, self.height)
    }

    /// Total number of tiles.
    pub fn area(&self) -> usize {
        self.tiles.len()
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Flat index for `pos`, or `None` if out of bounds.
    pub fn index(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.x as usize + pos.y as usize * self.width as usize)
        } else {
            None
        }
    }

    /// Position of a flat index. Caller guarantees `index < area()`.
    fn position_of(&self, index: usize) -> Position {
        let width = self.width.max(1) as usize;
        Position::new((index % width) as i32, (index / width) as i32)
    }

    pub fn get(&self, pos: Position) -> Option<TileType> {
        self.index(pos).and_then(|i| self.tiles.get(i).copied())
    }

    /// Whether the tile at `pos` is exactly `tile`. Out of bounds is never a match.
    pub fn is(&self, pos: Position, tile: TileType) -> bool {
        self.get(pos) == Some(tile)
    }

    /// Overwrite a tile. No-op for out-of-bounds positions.
    pub fn set(&mut self, pos: Position, tile: TileType) {
        if let Some(slot) = self.index(pos).and_then(|i| self.tiles.get_mut(i)) {
            *slot = tile;
        }
    }

    /// Walls block movement, and so does everything outside the map.
    pub fn is_blocking(&self, pos: Position) -> bool {
        self.get(pos).is_none_or(TileType::is_blocking)
    }

    /// Number of tiles of the given type.
    pub fn count(&self, tile: TileType) -> usize {
        self.tiles.iter().filter(|&&t| t == tile).count()
    }

    /// Every position holding `tile`, in row-major order.
    pub fn positions_of(&self, tile: TileType) -> impl Iterator<Item = Position> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(move |&(_, &t)| t == tile)
            .map(|(i, _)| self.position_of(i))
    }

    /// In-bounds positions within Chebyshev distance `radius` of `center`
    /// (the square around it, center included), row-major.
    pub fn square_around(
        &self,
        center: Position,
        radius: u32,
    ) -> impl Iterator<Item = Position> + '_ {
        let r = radius as i32;
        (-r..=r)
            .flat_map(move |dy| (-r..=r).map(move |dx| center.offset(dx, dy)))
            .filter(|&p| self.in_bounds(p))
    }
}
