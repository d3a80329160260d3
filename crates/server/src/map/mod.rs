//! Static map data.
//!
//! A `TileMap` is the read-only tile/teleporter view the simulation consumes:
//! tile types, teleporter lookups, random spawn positions and connected
//! floor regions. Maps are built once from configuration and shared between
//! runtimes through the `MapRegistry`.

mod registry;
mod teleporter;

pub use registry::{MapDefinition, MapRegistry, TeleportTarget};
pub use teleporter::{Teleporter, TeleporterManager};

use crate::config::TeleporterConfig;
use crate::error::MapError;
use crate::spatial::{Bounds, SpatialGrid};
use glam::Vec2;
use rand::Rng;
use std::collections::VecDeque;

/// Attempts made by `get_valid_spawn_position` before giving up.
const SPAWN_ATTEMPTS: usize = 100;

/// Tile type codes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileType {
    /// Impassable wall (0)
    Wall = 0,
    /// Open floor (1)
    Floor = 1,
    /// Safe zone players may spawn in (2)
    SafeSpawn = 2,
    /// Teleporter (3)
    Teleporter = 3,
    /// Safe zone players may not spawn in (4)
    SafeZone = 4,
}

impl TileType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(TileType::Wall),
            1 => Some(TileType::Floor),
            2 => Some(TileType::SafeSpawn),
            3 => Some(TileType::Teleporter),
            4 => Some(TileType::SafeZone),
            _ => None,
        }
    }

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Both safe zone kinds block enemies and bullets.
    #[inline]
    pub fn is_safe_zone(self) -> bool {
        matches!(self, TileType::SafeSpawn | TileType::SafeZone)
    }
}

/// A 4-connected group of tiles of one type.
#[derive(Debug, Clone)]
pub struct Region {
    pub tiles: Vec<(usize, usize)>,
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl Region {
    /// World-space bounding box of the region.
    pub fn bounds(&self, tile_size: f32) -> Bounds {
        Bounds::new(
            self.min_x as f32 * tile_size,
            self.min_y as f32 * tile_size,
            (self.max_x + 1) as f32 * tile_size,
            (self.max_y + 1) as f32 * tile_size,
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Tile grid of one map.
#[derive(Debug, Clone)]
pub struct TileMap {
    id: String,
    /// Width in tiles.
    width: usize,
    /// Height in tiles.
    height: usize,
    tile_size: f32,
    tiles: Vec<TileType>,
    teleporters: TeleporterManager,
}

impl TileMap {
    /// Build a map from rows of tile digits (`0`..`4`).
    pub fn from_rows(
        id: &str,
        tile_size: f32,
        rows: &[String],
        teleporters: &[TeleporterConfig],
    ) -> Result<Self, MapError> {
        if tile_size <= 0.0 {
            return Err(MapError::BadTileSize(id.to_string()));
        }
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        if width == 0 {
            return Err(MapError::Empty(id.to_string()));
        }

        let mut tiles = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(MapError::RaggedRow {
                    map: id.to_string(),
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, ch) in row.chars().enumerate() {
                let tile = ch
                    .to_digit(10)
                    .and_then(|d| TileType::from_code(d as u8))
                    .ok_or_else(|| MapError::UnknownTile {
                        map: id.to_string(),
                        tile: ch,
                        x,
                        y,
                    })?;
                tiles.push(tile);
            }
        }

        let mut map = Self {
            id: id.to_string(),
            width,
            height: rows.len(),
            tile_size,
            tiles,
            teleporters: TeleporterManager::default(),
        };

        for tp in teleporters {
            if map.get_tile_type(tp.x as i64, tp.y as i64) != TileType::Teleporter {
                return Err(MapError::TeleporterOffTile {
                    map: id.to_string(),
                    code: tp.code.clone(),
                    x: tp.x,
                    y: tp.y,
                });
            }
            map.teleporters.add(Teleporter {
                tile_x: tp.x,
                tile_y: tp.y,
                code: tp.code.clone(),
                destination: tp.destination.clone(),
            });
        }

        Ok(map)
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Width in tiles.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in tiles.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    #[inline]
    pub fn world_width(&self) -> f32 {
        self.width as f32 * self.tile_size
    }

    #[inline]
    pub fn world_height(&self) -> f32 {
        self.height as f32 * self.tile_size
    }

    /// Tile type at tile coordinates. Anything off the map is a wall.
    #[inline]
    pub fn get_tile_type(&self, x: i64, y: i64) -> TileType {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return TileType::Wall;
        }
        self.tiles[y as usize * self.width + x as usize]
    }

    #[inline]
    pub fn get_teleporter(&self, tile_x: usize, tile_y: usize) -> Option<&Teleporter> {
        self.teleporters.at(tile_x, tile_y)
    }

    #[inline]
    pub fn get_teleporter_by_code(&self, code: &str) -> Option<&Teleporter> {
        self.teleporters.by_code(code)
    }

    pub fn teleporters(&self) -> &TeleporterManager {
        &self.teleporters
    }

    /// World-space center of a tile.
    #[inline]
    pub fn tile_center(&self, tile_x: usize, tile_y: usize) -> Vec2 {
        Vec2::new(
            (tile_x as f32 + 0.5) * self.tile_size,
            (tile_y as f32 + 0.5) * self.tile_size,
        )
    }

    /// Pick a random position on a tile of `tile_type` that the grid
    /// accepts as a spawn point for a disc of `radius`.
    pub fn get_valid_spawn_position<R: Rng + ?Sized>(
        &self,
        tile_type: TileType,
        radius: f32,
        grid: &SpatialGrid,
        rng: &mut R,
    ) -> Option<Vec2> {
        let candidates: Vec<usize> = self
            .tiles
            .iter()
            .enumerate()
            .filter(|&(_, &t)| t == tile_type)
            .map(|(i, _)| i)
            .collect();
        if candidates.is_empty() {
            return None;
        }

        for _ in 0..SPAWN_ATTEMPTS {
            let idx = candidates[rng.random_range(0..candidates.len())];
            let tile_x = idx % self.width;
            let tile_y = idx / self.width;
            let min_x = tile_x as f32 * self.tile_size;
            let min_y = tile_y as f32 * self.tile_size;
            let pos = if self.tile_size > radius * 2.0 {
                Vec2::new(
                    rng.random_range(min_x + radius..min_x + self.tile_size - radius),
                    rng.random_range(min_y + radius..min_y + self.tile_size - radius),
                )
            } else {
                self.tile_center(tile_x, tile_y)
            };
            if grid.is_valid_spawn_position(pos.x, pos.y, radius) {
                return Some(pos);
            }
        }
        None
    }

    /// Flood fill every 4-connected region of `tile_type`, in row-major order
    /// of each region's first tile.
    pub fn find_connected_regions(&self, tile_type: TileType) -> Vec<Region> {
        let mut visited = vec![false; self.tiles.len()];
        let mut regions = Vec::new();
        let mut queue = VecDeque::new();

        for start in 0..self.tiles.len() {
            if visited[start] || self.tiles[start] != tile_type {
                continue;
            }
            visited[start] = true;
            queue.push_back(start);

            let mut region = Region {
                tiles: Vec::new(),
                min_x: usize::MAX,
                min_y: usize::MAX,
                max_x: 0,
                max_y: 0,
            };

            while let Some(idx) = queue.pop_front() {
                let x = idx % self.width;
                let y = idx / self.width;
                region.tiles.push((x, y));
                region.min_x = region.min_x.min(x);
                region.min_y = region.min_y.min(y);
                region.max_x = region.max_x.max(x);
                region.max_y = region.max_y.max(y);

                let mut visit = |nx: usize, ny: usize| {
                    let n = ny * self.width + nx;
                    if !visited[n] && self.tiles[n] == tile_type {
                        visited[n] = true;
                        queue.push_back(n);
                    }
                };
                if x > 0 {
                    visit(x - 1, y);
                }
                if x + 1 < self.width {
                    visit(x + 1, y);
                }
                if y > 0 {
                    visit(x, y - 1);
                }
                if y + 1 < self.height {
                    visit(x, y + 1);
                }
            }

            regions.push(region);
        }

        regions
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    pub(crate) fn rows(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_rejects_bad_rows() {
        assert!(matches!(
            TileMap::from_rows("m", 64.0, &rows(&["111", "11"]), &[]),
            Err(MapError::RaggedRow { row: 1, .. })
        ));
        assert!(matches!(
            TileMap::from_rows("m", 64.0, &rows(&["1x1"]), &[]),
            Err(MapError::UnknownTile { tile: 'x', x: 1, .. })
        ));
        assert!(matches!(
            TileMap::from_rows("m", 64.0, &[], &[]),
            Err(MapError::Empty(_))
        ));
        let tp = TeleporterConfig {
            x: 0,
            y: 0,
            code: "A".into(),
            destination: "b".into(),
        };
        assert!(matches!(
            TileMap::from_rows("m", 64.0, &rows(&["13"]), &[tp]),
            Err(MapError::TeleporterOffTile { .. })
        ));
    }

    #[test]
    fn test_tile_lookup_outside_is_wall() {
        let map = TileMap::from_rows("m", 32.0, &rows(&["12", "34"]), &[]).unwrap();
        assert_eq!(map.get_tile_type(1, 1), TileType::SafeZone);
        assert_eq!(map.get_tile_type(-1, 0), TileType::Wall);
        assert_eq!(map.get_tile_type(2, 0), TileType::Wall);
        assert_eq!(map.world_width(), 64.0);
        assert_eq!(map.tile_center(1, 0), Vec2::new(48.0, 16.0));
    }

    #[test]
    fn test_connected_regions() {
        let map = TileMap::from_rows(
            "m",
            10.0,
            &rows(&[
                "11011", //
                "11011",
                "00000",
                "01110",
            ]),
            &[],
        )
        .unwrap();
        let regions = map.find_connected_regions(TileType::Floor);
        assert_eq!(regions.len(), 3);
        assert_eq!(regions[0].len(), 4);
        assert_eq!((regions[0].min_x, regions[0].max_x), (0, 1));
        assert_eq!((regions[1].min_x, regions[1].max_x), (3, 4));
        assert_eq!(regions[2].len(), 3);
        assert_eq!(regions[2].bounds(10.0), Bounds::new(10.0, 30.0, 40.0, 40.0));
    }

    #[test]
    fn test_spawn_position_on_requested_tile() {
        let map = TileMap::from_rows(
            "m",
            64.0,
            &rows(&["00000", "02110", "00000"]),
            &[],
        )
        .unwrap();
        let grid = SpatialGrid::from_map(&map, None);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let pos = map
                .get_valid_spawn_position(TileType::SafeSpawn, 20.0, &grid, &mut rng)
                .unwrap();
            assert_eq!((pos.x / 64.0).floor() as i64, 1);
            assert_eq!((pos.y / 64.0).floor() as i64, 1);
        }
        assert!(map
            .get_valid_spawn_position(TileType::SafeZone, 20.0, &grid, &mut rng)
            .is_none());
    }
}
