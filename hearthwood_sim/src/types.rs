// Core types shared across the simulation.
//
// Defines tile positions (`Position`), the tile and structure enums, the agent
// state enum, and the strongly-typed sequential ids for agents, tasks and
// notifications. Everything derives `Serialize` so snapshots and scripted
// commands can cross the JSON boundary to the UI or the headless driver.
//
// **Critical constraint: determinism.** Ids come from counters owned by the
// world state (see `IdCounters`), never from globals, so two sims with the
// same seed and commands hand out the same ids.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A tile position. `x` grows to the right, `y` grows downward (screen
/// convention), so "up" is `y - 1`.
///
/// Signed so neighbour offsets near the edge stay representable; the grid
/// bounds-checks every access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance, used to rank tasks for an idle agent.
    pub fn manhattan_distance(self, other: Self) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    /// The position shifted by `(dx, dy)`.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// 4-connected neighbours in the fixed search order: up, down, left,
    /// right. Pathfinding and warmth both rely on this order for
    /// deterministic tie-breaking.
    pub const fn neighbors(self) -> [Position; 4] {
        [
            self.offset(0, -1),
            self.offset(0, 1),
            self.offset(-1, 0),
            self.offset(1, 0),
        ]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Sequential ids
// ---------------------------------------------------------------------------

macro_rules! sequential_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

sequential_id!(/// Unique, stable identifier of a worker agent.
AgentId);
sequential_id!(/// Unique, monotonic identifier of a queued task.
TaskId);
sequential_id!(/// Unique, monotonic identifier of a player-facing notification.
NotificationId);

/// Monotonic id counters, owned by the world so independent sims never share
/// numbering.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCounters {
    next_agent: u64,
    next_task: u64,
    next_notification: u64,
}

impl IdCounters {
    pub fn next_agent(&mut self) -> AgentId {
        let id = AgentId(self.next_agent);
        self.next_agent += 1;
        id
    }

    pub fn next_task(&mut self) -> TaskId {
        let id = TaskId(self.next_task);
        self.next_task += 1;
        id
    }

    pub fn next_notification(&mut self) -> NotificationId {
        let id = NotificationId(self.next_notification);
        self.next_notification += 1;
        id
    }
}

// ---------------------------------------------------------------------------
// Tiles and structures
// ---------------------------------------------------------------------------

/// The content of a single grid tile.
///
/// Legal transitions: grass → tree (growth), tree → grass (chopped),
/// grass → any structure (built). Nothing ever turns back into a tree except
/// by growth, and structures are permanent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    #[default]
    Grass,
    Tree,
    Wall,
    Door,
    Bed,
    Fireplace,
}

impl TileType {
    /// Walls are the only tiles agents cannot walk through.
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::Wall)
    }

    /// Walls and doors stop warmth from spreading.
    pub const fn blocks_warmth(self) -> bool {
        matches!(self, Self::Wall | Self::Door)
    }

    /// ASCII glyph used by `Grid::parse` / `Grid::render`.
    pub const fn glyph(self) -> char {
        match self {
            Self::Grass => '.',
            Self::Tree => 'T',
            Self::Wall => '#',
            Self::Door => 'D',
            Self::Bed => 'B',
            Self::Fireplace => 'F',
        }
    }

    pub const fn from_glyph(c: char) -> Option<Self> {
        match c {
            '.' => Some(Self::Grass),
            'T' => Some(Self::Tree),
            '#' => Some(Self::Wall),
            'D' => Some(Self::Door),
            'B' => Some(Self::Bed),
            'F' => Some(Self::Fireplace),
            _ => None,
        }
    }
}

/// Structures a player can order built on a grass tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildType {
    Wall,
    Door,
    Bed,
    Fireplace,
}

impl BuildType {
    pub const ALL: [BuildType; 4] = [Self::Wall, Self::Door, Self::Bed, Self::Fireplace];

    /// The tile a finished build leaves behind.
    pub const fn tile(self) -> TileType {
        match self {
            Self::Wall => TileType::Wall,
            Self::Door => TileType::Door,
            Self::Bed => TileType::Bed,
            Self::Fireplace => TileType::Fireplace,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Wall => "wall",
            Self::Door => "door",
            Self::Bed => "bed",
            Self::Fireplace => "fireplace",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Agent state
// ---------------------------------------------------------------------------

/// What an agent is doing this tick. `Chopping` and `Building` are display
/// states that last exactly the tick the work happened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    #[default]
    Idle,
    Moving,
    Chopping,
    Building,
}
