//! Server error types.

use thiserror::Error;

/// Errors raised while building a tile map from its configuration.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("map `{0}` has no tile rows")]
    Empty(String),

    #[error("map `{map}` row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        map: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("map `{map}` has unknown tile {tile:?} at ({x}, {y})")]
    UnknownTile {
        map: String,
        tile: char,
        x: usize,
        y: usize,
    },

    #[error("map `{map}` teleporter `{code}` at ({x}, {y}) is not on a teleporter tile")]
    TeleporterOffTile {
        map: String,
        code: String,
        x: usize,
        y: usize,
    },

    #[error("map `{0}` has a non-positive tile size")]
    BadTileSize(String),

    #[error("map `{0}` is defined twice")]
    Duplicate(String),
}

/// Errors raised by the orchestrator.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown map `{0}`")]
    UnknownMap(String),

    #[error("unknown player {0}")]
    UnknownPlayer(u32),

    #[error("no free spawn position on map `{0}`")]
    NoSpawnPosition(String),
}
