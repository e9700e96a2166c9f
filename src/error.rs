use thiserror::Error;

use crate::grid::TilePos;
use crate::population::PopulationId;

/// Misconfiguration detected while building a world. Always fatal.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("grid must have at least one tile (got {width}x{height})")]
    EmptyGrid { width: u32, height: u32 },
    #[error("map row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown biome symbol '{symbol}' at ({x}, {y})")]
    UnknownBiome { symbol: char, x: u32, y: u32 },
    #[error("map has no land tiles")]
    NoLand,
    #[error("founder at {0} is out of bounds or on ocean")]
    InvalidFounder(TilePos),
    #[error("invalid constant `{name}`: {reason}")]
    InvalidConstant { name: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn constant(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidConstant {
            name,
            reason: reason.into(),
        }
    }
}

/// A broken world-state invariant. These indicate a bug, not a policy outcome.
#[derive(Debug, Error, PartialEq)]
pub enum InvariantViolation {
    #[error("tile {pos} occupant {tile:?} disagrees with occupancy index ({indexed})")]
    Occupancy {
        pos: TilePos,
        tile: Option<PopulationId>,
        indexed: bool,
    },
    #[error("population {id} at {pos} is not the occupant of its tile")]
    Misplaced { id: PopulationId, pos: TilePos },
    #[error("tile {pos} crowdedness {found} differs from recomputed {expected}")]
    Crowdedness {
        pos: TilePos,
        expected: f64,
        found: f64,
    },
    #[error("population {id} health {health} outside [0, {max}]")]
    Health { id: PopulationId, health: f64, max: f64 },
    #[error("population {id} culture weights sum to {sum}")]
    CultureSum { id: PopulationId, sum: f64 },
}
