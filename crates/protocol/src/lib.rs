//! Shared protocol crate for native-evade.
//!
//! This crate contains:
//! - Binary writing utilities
//! - Entity snapshot records handed to the network layer
//! - Shared types (Color)

mod binary;
pub mod snapshot;

use serde::Serialize;

pub use binary::BinaryWriter;
pub use snapshot::{
    BulletRecord, EnemyDetail, EnemyRecord, MapSnapshot, PlayerRecord, SNAPSHOT_OPCODE,
};

/// RGB color used for players and enemies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}
