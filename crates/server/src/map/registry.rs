//! Registry of every configured map and the teleporter links between them.

use super::TileMap;
use crate::config::{EnemySpawnConfig, MapConfig};
use crate::error::MapError;
use glam::Vec2;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Static definition of a map: its tiles plus what to spawn on load.
#[derive(Debug, Clone)]
pub struct MapDefinition {
    pub map: Arc<TileMap>,
    /// Grid cell size override (defaults to the tile size).
    pub cell_size: Option<f32>,
    pub enemies: Vec<EnemySpawnConfig>,
}

/// Where a teleporter sends a player.
#[derive(Debug, Clone, PartialEq)]
pub struct TeleportTarget {
    pub map_id: String,
    pub position: Vec2,
}

/// All maps known to the server, keyed by id.
#[derive(Debug, Default)]
pub struct MapRegistry {
    maps: HashMap<String, MapDefinition>,
}

impl MapRegistry {
    /// Parse every configured map.
    pub fn from_config(configs: &[MapConfig]) -> Result<Self, MapError> {
        let mut registry = Self::default();
        for cfg in configs {
            if registry.maps.contains_key(&cfg.id) {
                return Err(MapError::Duplicate(cfg.id.clone()));
            }
            let map = TileMap::from_rows(&cfg.id, cfg.tile_size, &cfg.tiles, &cfg.teleporters)?;
            info!(
                "Registered map {} ({}x{} tiles, {} teleporters, {} spawn groups)",
                cfg.id,
                map.width(),
                map.height(),
                map.teleporters().len(),
                cfg.enemies.len()
            );
            registry.insert(MapDefinition {
                map: Arc::new(map),
                cell_size: cfg.cell_size,
                enemies: cfg.enemies.clone(),
            });
        }
        Ok(registry)
    }

    pub fn insert(&mut self, def: MapDefinition) {
        self.maps.insert(def.map.id().to_string(), def);
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<&MapDefinition> {
        self.maps.get(id)
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.maps.contains_key(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Warn about teleporters that lead nowhere. Returns the number of
    /// broken links.
    pub fn validate_links(&self) -> usize {
        let mut broken = 0;
        for def in self.maps.values() {
            for tp in def.map.teleporters().iter() {
                match self.maps.get(&tp.destination) {
                    None => {
                        warn!(
                            "Teleporter {} on map {} points to unknown map {}",
                            tp.code,
                            def.map.id(),
                            tp.destination
                        );
                        broken += 1;
                    }
                    Some(dest) if dest.map.get_teleporter_by_code(&tp.code).is_none() => {
                        warn!(
                            "Teleporter {} on map {} has no partner on map {}",
                            tp.code,
                            def.map.id(),
                            tp.destination
                        );
                        broken += 1;
                    }
                    Some(_) => {}
                }
            }
        }
        broken
    }

    /// Arrival point for a teleporter with `code` leading to `destination`:
    /// the center of the same-code teleporter on that map.
    pub fn resolve_link(&self, destination: &str, code: &str) -> Option<TeleportTarget> {
        let dest = self.maps.get(destination)?;
        let partner = dest.map.get_teleporter_by_code(code)?;
        Some(TeleportTarget {
            map_id: destination.to_string(),
            position: dest.map.tile_center(partner.tile_x, partner.tile_y),
        })
    }
}
