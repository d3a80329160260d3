//! Native Evade simulation server library.

pub mod ai;
pub mod clock;
pub mod config;
pub mod entity;
pub mod error;
pub mod map;
pub mod physics;
pub mod runtime;
pub mod server;
pub mod spatial;
pub mod spawner;

// Re-export commonly used types
pub use config::Config;
pub use error::{MapError, SimError};
pub use server::{GameState, WorldSnapshot, run};
