// Commands that mutate simulation state.
//
// Everything outside the sim (a browser UI, the headless driver's script
// file, tests) changes the world through `SimAction`s, applied between ticks
// by `SimState::apply_action`. Gameplay actions that fail validation are
// silent no-ops, exactly like calling the matching `SimState` method.
//
// The UI-facing actions mirror how a player interacts with the map:
// - `DesignateTile`: a click. In build mode it orders the selected structure,
//   otherwise it orders a chop.
// - `EnqueueChopArea`: a drag-select. Orders a chop for every tree inside the
//   rectangle, in row-major order.
// - `SetBuildMode`: select a structure to place, or `None` to go back to
//   chopping.
//
// A `SimCommand` pairs an action with the tick it should be applied before,
// which is how scripted runs (`hearthwood_headless --script`) are written.
// In JSON the action's fields sit beside `tick`:
// `{ "tick": 5, "action": "enqueue_chop", "position": { "x": 2, "y": 3 } }`.
//
// See also: `sim.rs` for `apply_action`.
//
// **Critical constraint: determinism.** Commands are the sole external input
// to the sim.

use crate::types::{BuildType, Position};
use serde::{Deserialize, Serialize};

/// An action scheduled for a specific tick.
///
/// Applied once the sim's tick counter has reached `tick`, before the next
/// tick runs. Tick 0 means "before the first tick".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimCommand {
    pub tick: u64,
    #[serde(flatten)]
    pub action: SimAction,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SimAction {
    /// Reset to a freshly generated world of the given size.
    Initialize { width: u32, height: u32 },
    Start,
    Stop,
    EnqueueChop { position: Position },
    /// Chop every tree in the rectangle spanned by the two corners (inclusive,
    /// in either order).
    EnqueueChopArea { from: Position, to: Position },
    EnqueueBuild {
        position: Position,
        build_type: BuildType,
    },
    SetBuildMode { build_type: Option<BuildType> },
    /// Player clicked a tile: chop or build depending on build mode.
    DesignateTile { position: Position },
}
