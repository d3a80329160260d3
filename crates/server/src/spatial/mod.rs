//! Spatial indexing utilities.
//!
//! A uniform grid per map: static terrain flags plus dynamic entity
//! membership, answering the broad-phase queries used by movement and
//! collision.

mod bounds;
mod grid;

pub use bounds::Bounds;
pub use grid::{Spatial, SpatialGrid, TeleporterInfo};
