// Data-driven game configuration.
//
// All tunable simulation parameters live in `GameConfig`. The sim never uses
// magic numbers: growth cadence, spawn odds, warmth reach, build costs and
// the chop yield are all read from here. Configs load from JSON
// (`GameConfig::from_json`); every field has a default, so a file only needs
// the keys it overrides.
//
// Parameters are grouped by the component that reads them:
// `GrowthParams` (`growth.rs`), `WarmthParams` (`warmth.rs`), `SpawnParams`
// (`spawn.rs`) and `BuildCosts` (`task.rs`, `sim.rs`).
//
// See also: `sim.rs`, which owns the config as part of `SimState`.
//
// **Critical constraint: determinism.** Two sims only stay in lockstep if
// they run with identical configs.

use crate::types::BuildType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a `GameConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be within [0, 1], got {value}")]
    ProbabilityOutOfRange { field: &'static str, value: f64 },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("growth.max_coverage must be within (0, 1], got {0}")]
    CoverageOutOfRange(f64),
}

/// Tree propagation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthParams {
    /// Ticks between growth passes.
    pub interval_ticks: u64,
    /// Per-tree spread chance on an empty map. Scaled down linearly as
    /// coverage approaches `max_coverage`.
    pub base_chance: f64,
    /// Tree coverage (trees / tiles) at which growth stops entirely.
    pub max_coverage: f64,
    /// Chebyshev radius in which a tree may seed a new one.
    pub radius: u32,
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self {
            interval_ticks: 100,
            base_chance: 0.10,
            max_coverage: 0.70,
            radius: 3,
        }
    }
}

/// Fireplace warmth parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarmthParams {
    /// Maximum BFS steps from a fireplace.
    pub radius: u32,
}

impl Default for WarmthParams {
    fn default() -> Self {
        Self { radius: 5 }
    }
}

/// Worker spawning parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnParams {
    /// Ticks between spawn checks.
    pub interval_ticks: u64,
    /// Chance that a spawn check succeeds.
    pub chance: f64,
    /// Population cap; no spawns once this many agents exist.
    pub max_workers: usize,
    /// Chebyshev radius around the chosen fireplace searched for a free tile.
    pub radius: u32,
}

impl Default for SpawnParams {
    fn default() -> Self {
        Self {
            interval_ticks: 10,
            chance: 0.10,
            max_workers: 2,
            radius: 2,
        }
    }
}

/// Wood cost of each structure, reserved when the build is ordered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildCosts {
    pub wall: u32,
    pub door: u32,
    pub bed: u32,
    pub fireplace: u32,
}

impl BuildCosts {
    pub fn cost(&self, build_type: BuildType) -> u32 {
        match build_type {
            BuildType::Wall => self.wall,
            BuildType::Door => self.door,
            BuildType::Bed => self.bed,
            BuildType::Fireplace => self.fireplace,
        }
    }
}

impl Default for BuildCosts {
    fn default() -> Self {
        Self {
            wall: 1,
            door: 2,
            bed: 3,
            fireplace: 5,
        }
    }
}

/// Top-level game configuration. Loaded once, never mutated by the sim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Real-time milliseconds between ticks. Only drivers read this; the sim
    /// itself counts ticks.
    pub tick_duration_ms: u32,

    /// Grid size used when a game is initialized without explicit dimensions.
    pub world_size: (u32, u32),

    /// Pixel size of one tile, for deriving grid size from a viewport.
    pub tile_size_px: u32,

    /// Chance that each tile starts as a tree in a freshly generated map.
    pub initial_tree_density: f64,

    /// Wood in the stockpile at game start.
    pub initial_wood: u32,

    /// Wood credited for each chopped tree.
    pub chop_yield: u32,

    /// Maximum notifications retained; older ones are dropped first.
    pub notification_capacity: usize,

    pub growth: GrowthParams,
    pub warmth: WarmthParams,
    pub spawn: SpawnParams,
    pub build_costs: BuildCosts,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_duration_ms: 100,
            world_size: (40, 30),
            tile_size_px: 20,
            initial_tree_density: 0.15,
            initial_wood: 0,
            chop_yield: 1,
            notification_capacity: 20,
            growth: GrowthParams::default(),
            warmth: WarmthParams::default(),
            spawn: SpawnParams::default(),
            build_costs: BuildCosts::default(),
        }
    }
}

impl GameConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the sim cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("initial_tree_density", self.initial_tree_density),
            ("growth.base_chance", self.growth.base_chance),
            ("spawn.chance", self.spawn.chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ProbabilityOutOfRange { field, value });
            }
        }
        if !(self.growth.max_coverage > 0.0 && self.growth.max_coverage <= 1.0) {
            return Err(ConfigError::CoverageOutOfRange(self.growth.max_coverage));
        }
        for (field, value) in [
            ("growth.interval_ticks", self.growth.interval_ticks),
            ("spawn.interval_ticks", self.spawn.interval_ticks),
            ("world_size.0", u64::from(self.world_size.0)),
            ("world_size.1", u64::from(self.world_size.1)),
            ("notification_capacity", self.notification_capacity as u64),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn defaults_match_documented_tuning() {
        let config = GameConfig::default();
        assert_eq!(config.growth.interval_ticks, 100);
        assert_eq!(config.growth.max_coverage, 0.70);
        assert_eq!(config.growth.radius, 3);
        assert_eq!(config.spawn.interval_ticks, 10);
        assert_eq!(config.spawn.max_workers, 2);
        assert_eq!(config.spawn.radius, 2);
        assert_eq!(config.build_costs.cost(BuildType::Wall), 1);
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let json = r#"{
            "chop_yield": 4,
            "growth": { "base_chance": 0.5 },
            "build_costs": { "fireplace": 9 }
        }"#;
        let config = GameConfig::from_json(json).unwrap();
        assert_eq!(config.chop_yield, 4);
        assert_eq!(config.growth.base_chance, 0.5);
        assert_eq!(config.growth.interval_ticks, 100, "untouched field keeps default");
        assert_eq!(config.build_costs.fireplace, 9);
        assert_eq!(config.build_costs.wall, 1);
    }

    #[test]
    fn empty_object_is_the_default_config() {
        assert_eq!(GameConfig::from_json("{}").unwrap(), GameConfig::default());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = GameConfig::from_json("{ chop_yield: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let err = GameConfig::from_json(r#"{ "spawn": { "chance": 1.5 } }"#).unwrap_err();
        assert!(
            matches!(
                err,
                ConfigError::ProbabilityOutOfRange {
                    field: "spawn.chance",
                    ..
                }
            ),
            "got {err:?}"
        );
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = GameConfig::from_json(r#"{ "growth": { "interval_ticks": 0 } }"#).unwrap_err();
        assert!(
            matches!(
                err,
                ConfigError::Zero {
                    field: "growth.interval_ticks"
                }
            ),
            "got {err:?}"
        );
    }

    #[test]
    fn zero_coverage_is_rejected() {
        let err = GameConfig::from_json(r#"{ "growth": { "max_coverage": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::CoverageOutOfRange(_)), "got {err:?}");
    }
}
