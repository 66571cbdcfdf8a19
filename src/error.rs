//! Error types.

use crate::Coord;
use thiserror::Error;

/// Errors raised while building a [`Simulation`](crate::Simulation).
#[derive(Debug, Error)]
pub enum InitError {
    /// The map has no destination cells, so no vehicle could ever be given a trip.
    #[error("the map contains no destinations")]
    NoDestinations,
    /// The map has zero width or height.
    #[error("the map is empty")]
    EmptyGrid,
    /// A placement lies outside the map.
    #[error("placement at {coord} is outside the map")]
    OutOfBounds { coord: Coord },
    /// A cell was given more than one of road, destination or obstacle.
    #[error("cell {coord} has conflicting features")]
    ConflictingFeatures { coord: Coord },
    /// A traffic light was placed on a cell without a road.
    #[error("traffic light at {coord} has no road")]
    LightWithoutRoad { coord: Coord },
    /// A traffic light was given a period of zero.
    #[error("traffic light at {coord} has a zero period")]
    InvalidLightPeriod { coord: Coord },
    #[error(transparent)]
    Map(#[from] MapError),
}

/// Errors raised while parsing a textual map.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("the map has no rows")]
    Empty,
    /// Every row of a map must be the same width.
    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("invalid symbol table: {0}")]
    SymbolTable(#[from] serde_json::Error),
}

/// Errors raised when placing a vehicle explicitly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpawnError {
    #[error("cell {coord} is outside the grid")]
    OutOfBounds { coord: Coord },
    /// The cell holds a vehicle or an obstacle.
    #[error("cell {coord} is blocked")]
    Blocked { coord: Coord },
    #[error("there are no destinations to choose from")]
    NoDestinations,
}

/// Errors raised by grid occupancy updates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("cell {coord} is outside the grid")]
    OutOfBounds { coord: Coord },
    #[error("cell {coord} is at capacity")]
    CellFull { coord: Coord },
}
