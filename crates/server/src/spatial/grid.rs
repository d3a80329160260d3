//! Uniform spatial grid for one map.
//!
//! Every cell carries static terrain flags derived from the map's tiles
//! (wall, safe zone, teleporter) and the set of entity ids whose AABB
//! overlaps it. Entities are re-bucketed only when their covered cell range
//! changes, which keeps the common "moved a few pixels" case O(1).

use super::Bounds;
use crate::entity::EntityId;
use crate::map::{TileMap, TileType};
use fixedbitset::FixedBitSet;
use glam::Vec2;
use std::collections::HashMap;

/// Anything that can be stored in the grid.
pub trait Spatial {
    fn id(&self) -> EntityId;
    fn position(&self) -> Vec2;
    fn radius(&self) -> f32;
}

/// Teleporter data attached to a teleporter cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeleporterInfo {
    pub code: String,
    pub destination: String,
}

/// Inclusive range of cells covered by an AABB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRange {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl CellRange {
    #[inline]
    fn iter(self) -> impl Iterator<Item = (usize, usize)> {
        (self.min_y..=self.max_y).flat_map(move |y| (self.min_x..=self.max_x).map(move |x| (x, y)))
    }
}

/// Spatial grid over one map's world extent.
pub struct SpatialGrid {
    width: f32,
    height: f32,
    cell_size: f32,
    cols: usize,
    rows: usize,

    // Static terrain flags, one bit per cell.
    walls: FixedBitSet,
    safe_zones: FixedBitSet,
    no_spawn: FixedBitSet,
    teleporters: FixedBitSet,
    teleporter_info: HashMap<usize, TeleporterInfo>,

    /// Resident entity ids per cell.
    cells: Vec<Vec<EntityId>>,
    /// Cell range each registered entity currently occupies.
    ranges: HashMap<EntityId, CellRange>,
}

impl SpatialGrid {
    /// Create an empty grid (all floor) covering `width` x `height`.
    pub fn new(width: f32, height: f32, cell_size: f32) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { 1.0 };
        let cols = ((width / cell_size).ceil() as usize).max(1);
        let rows = ((height / cell_size).ceil() as usize).max(1);
        let count = cols * rows;

        Self {
            width,
            height,
            cell_size,
            cols,
            rows,
            walls: FixedBitSet::with_capacity(count),
            safe_zones: FixedBitSet::with_capacity(count),
            no_spawn: FixedBitSet::with_capacity(count),
            teleporters: FixedBitSet::with_capacity(count),
            teleporter_info: HashMap::new(),
            cells: vec![Vec::new(); count],
            ranges: HashMap::with_capacity(256),
        }
    }

    /// Build a grid from a tile map. Cell size defaults to the tile size.
    ///
    /// Each cell takes the flags of the tile under its center, so a tile may
    /// span several cells or a cell several tiles.
    pub fn from_map(map: &TileMap, cell_size: Option<f32>) -> Self {
        let mut grid = Self::new(
            map.world_width(),
            map.world_height(),
            cell_size.unwrap_or(map.tile_size()),
        );

        for cy in 0..grid.rows {
            for cx in 0..grid.cols {
                let center_x = (cx as f32 + 0.5) * grid.cell_size;
                let center_y = (cy as f32 + 0.5) * grid.cell_size;
                let tile_x = (center_x / map.tile_size()).floor() as i64;
                let tile_y = (center_y / map.tile_size()).floor() as i64;
                let tile = map.get_tile_type(tile_x, tile_y);
                let info = if tile == TileType::Teleporter {
                    map.get_teleporter(tile_x as usize, tile_y as usize)
                        .map(|t| TeleporterInfo {
                            code: t.code.clone(),
                            destination: t.destination.clone(),
                        })
                } else {
                    None
                };
                grid.set_cell_flags(cx, cy, tile, info);
            }
        }

        grid
    }

    /// Set the static flags of one cell from a tile type.
    pub fn set_cell_flags(
        &mut self,
        cx: usize,
        cy: usize,
        tile: TileType,
        teleporter: Option<TeleporterInfo>,
    ) {
        if cx >= self.cols || cy >= self.rows {
            return;
        }
        let idx = cy * self.cols + cx;
        self.walls.set(idx, tile == TileType::Wall);
        self.safe_zones.set(idx, tile.is_safe_zone());
        self.no_spawn.set(idx, tile == TileType::SafeZone);
        self.teleporters.set(idx, tile == TileType::Teleporter);
        match teleporter {
            Some(info) if tile == TileType::Teleporter => {
                self.teleporter_info.insert(idx, info);
            }
            _ => {
                self.teleporter_info.remove(&idx);
            }
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid dimensions in cells (columns, rows).
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// True bounding box of a cell.
    #[inline]
    pub fn cell_bounds(&self, cx: usize, cy: usize) -> Bounds {
        let min_x = cx as f32 * self.cell_size;
        let min_y = cy as f32 * self.cell_size;
        Bounds::new(min_x, min_y, min_x + self.cell_size, min_y + self.cell_size)
    }

    /// Cells covered by the AABB of a disc, clamped to the grid.
    ///
    /// The upper index uses `ceil - 1` so an AABB that only touches a cell
    /// edge does not claim the neighbouring cell.
    #[inline]
    fn range_for(&self, pos: Vec2, radius: f32) -> CellRange {
        let max_cx = (self.cols - 1) as i64;
        let max_cy = (self.rows - 1) as i64;
        let min_x = ((pos.x - radius) / self.cell_size).floor() as i64;
        let min_y = ((pos.y - radius) / self.cell_size).floor() as i64;
        let max_x = ((pos.x + radius) / self.cell_size).ceil() as i64 - 1;
        let max_y = ((pos.y + radius) / self.cell_size).ceil() as i64 - 1;

        let min_x = min_x.clamp(0, max_cx);
        let min_y = min_y.clamp(0, max_cy);
        let max_x = max_x.clamp(0, max_cx).max(min_x);
        let max_y = max_y.clamp(0, max_cy).max(min_y);

        CellRange {
            min_x: min_x as usize,
            min_y: min_y as usize,
            max_x: max_x as usize,
            max_y: max_y as usize,
        }
    }

    #[inline]
    fn index(&self, cx: usize, cy: usize) -> usize {
        cy * self.cols + cx
    }

    fn add_to_cells(&mut self, id: EntityId, range: CellRange) {
        for (cx, cy) in range.iter() {
            let idx = self.index(cx, cy);
            self.cells[idx].push(id);
        }
    }

    fn remove_from_cells(&mut self, id: EntityId, range: CellRange) {
        for (cx, cy) in range.iter() {
            let idx = self.index(cx, cy);
            let cell = &mut self.cells[idx];
            if let Some(pos) = cell.iter().position(|&e| e == id) {
                cell.swap_remove(pos);
            }
        }
    }

    /// Register an entity. Re-inserting a known id behaves like `update`.
    pub fn insert<E: Spatial + ?Sized>(&mut self, entity: &E) {
        if self.ranges.contains_key(&entity.id()) {
            self.update(entity);
            return;
        }
        let range = self.range_for(entity.position(), entity.radius());
        self.add_to_cells(entity.id(), range);
        self.ranges.insert(entity.id(), range);
    }

    /// Register many entities at once.
    pub fn bulk_insert<'a, E, I>(&mut self, entities: I)
    where
        E: Spatial + 'a,
        I: IntoIterator<Item = &'a E>,
    {
        for entity in entities {
            self.insert(entity);
        }
    }

    /// Remove an entity. Returns false if it was not registered.
    pub fn remove(&mut self, id: EntityId) -> bool {
        match self.ranges.remove(&id) {
            Some(range) => {
                self.remove_from_cells(id, range);
                true
            }
            None => false,
        }
    }

    /// Refresh an entity's cell membership after it moved or resized.
    ///
    /// Returns true if the entity was re-bucketed. An unchanged cell range
    /// is a single hash lookup and leaves every bucket untouched.
    pub fn update<E: Spatial + ?Sized>(&mut self, entity: &E) -> bool {
        let id = entity.id();
        let range = self.range_for(entity.position(), entity.radius());
        match self.ranges.get(&id).copied() {
            Some(old) if old == range => false,
            Some(old) => {
                self.remove_from_cells(id, old);
                self.add_to_cells(id, range);
                self.ranges.insert(id, range);
                true
            }
            None => {
                self.add_to_cells(id, range);
                self.ranges.insert(id, range);
                true
            }
        }
    }

    #[inline]
    pub fn contains(&self, id: EntityId) -> bool {
        self.ranges.contains_key(&id)
    }

    /// Number of registered entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Ids sharing at least one cell with the given entity, excluding itself.
    pub fn get_nearby_entities(&self, id: EntityId) -> Vec<EntityId> {
        let Some(range) = self.ranges.get(&id).copied() else {
            return Vec::new();
        };
        let mut result = self.collect(range);
        result.retain(|&other| other != id);
        result
    }

    /// Ids in every cell overlapping the bounding box of a disc.
    pub fn query_area(&self, x: f32, y: f32, radius: f32) -> Vec<EntityId> {
        let range = self.range_for(Vec2::new(x, y), radius);
        self.collect(range)
    }

    fn collect(&self, range: CellRange) -> Vec<EntityId> {
        let mut result = Vec::with_capacity(16);
        for (cx, cy) in range.iter() {
            result.extend_from_slice(&self.cells[self.index(cx, cy)]);
        }
        result.sort_unstable();
        result.dedup();
        result
    }

    /// Cells currently holding `id`, as (column, row).
    pub fn cells_of(&self, id: EntityId) -> Vec<(usize, usize)> {
        match self.ranges.get(&id) {
            Some(range) => range.iter().collect(),
            None => Vec::new(),
        }
    }

    /// Resident ids of one cell.
    pub fn entities_in_cell(&self, cx: usize, cy: usize) -> &[EntityId] {
        if cx >= self.cols || cy >= self.rows {
            return &[];
        }
        &self.cells[self.index(cx, cy)]
    }

    /// Whether the disc lies fully inside the world extent.
    #[inline]
    pub fn in_bounds(&self, pos: Vec2, radius: f32) -> bool {
        pos.x - radius >= 0.0
            && pos.y - radius >= 0.0
            && pos.x + radius <= self.width
            && pos.y + radius <= self.height
    }

    /// True if the AABB overlaps the real box of any cell flagged in `flags`.
    fn overlaps_flagged(&self, flags: &FixedBitSet, pos: Vec2, radius: f32) -> bool {
        let aabb = Bounds::from_center(pos.x, pos.y, radius);
        self.range_for(pos, radius).iter().any(|(cx, cy)| {
            flags.contains(self.index(cx, cy)) && self.cell_bounds(cx, cy).intersects(&aabb)
        })
    }

    pub fn check_wall_collision(&self, pos: Vec2, radius: f32) -> bool {
        self.overlaps_flagged(&self.walls, pos, radius)
    }

    pub fn check_safe_zone_collision(&self, pos: Vec2, radius: f32) -> bool {
        self.overlaps_flagged(&self.safe_zones, pos, radius)
    }

    pub fn check_teleporter_collision(&self, pos: Vec2, radius: f32) -> bool {
        self.overlaps_flagged(&self.teleporters, pos, radius)
    }

    /// In bounds and clear of walls, teleporters and non-spawnable safe zones.
    pub fn is_valid_spawn_position(&self, x: f32, y: f32, radius: f32) -> bool {
        let pos = Vec2::new(x, y);
        self.in_bounds(pos, radius)
            && !self.check_wall_collision(pos, radius)
            && !self.check_teleporter_collision(pos, radius)
            && !self.overlaps_flagged(&self.no_spawn, pos, radius)
    }

    /// The teleporter whose cells entirely cover the disc, if any.
    ///
    /// Every cell the disc touches must be a teleporter cell with the same
    /// code.
    pub fn teleporter_containing(&self, pos: Vec2, radius: f32) -> Option<&TeleporterInfo> {
        if !self.in_bounds(pos, radius) {
            return None;
        }
        let mut found: Option<&TeleporterInfo> = None;
        for (cx, cy) in self.range_for(pos, radius).iter() {
            if !self.cell_bounds(cx, cy).intersects_circle(pos, radius) {
                continue;
            }
            let idx = self.index(cx, cy);
            let info = self.teleporter_info.get(&idx)?;
            match found {
                Some(prev) if prev.code != info.code => return None,
                Some(_) => {}
                None => found = Some(info),
            }
        }
        found
    }

    #[inline]
    pub fn is_fully_inside_teleporter(&self, pos: Vec2, radius: f32) -> bool {
        self.teleporter_containing(pos, radius).is_some()
    }

    /// True if no teleporter cell touches the disc.
    pub fn is_fully_outside_teleporter(&self, pos: Vec2, radius: f32) -> bool {
        !self.range_for(pos, radius).iter().any(|(cx, cy)| {
            self.teleporters.contains(self.index(cx, cy))
                && self.cell_bounds(cx, cy).intersects_circle(pos, radius)
        })
    }

    /// Drop all dynamic membership. Static flags are kept.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.ranges.clear();
    }
}

impl std::fmt::Debug for SpatialGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialGrid")
            .field("cols", &self.cols)
            .field("rows", &self.rows)
            .field("cell_size", &self.cell_size)
            .field("entities", &self.ranges.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    struct Dot {
        id: EntityId,
        pos: Vec2,
        radius: f32,
    }

    impl Spatial for Dot {
        fn id(&self) -> EntityId {
            self.id
        }
        fn position(&self) -> Vec2 {
            self.pos
        }
        fn radius(&self) -> f32 {
            self.radius
        }
    }

    fn dot(id: EntityId, x: f32, y: f32, radius: f32) -> Dot {
        Dot { id, pos: Vec2::new(x, y), radius }
    }

    /// Cells whose box strictly intersects the entity's AABB.
    fn expected_cells(grid: &SpatialGrid, d: &Dot) -> Vec<(usize, usize)> {
        let aabb = Bounds::from_center(d.pos.x, d.pos.y, d.radius);
        let (cols, rows) = grid.dimensions();
        let mut out = Vec::new();
        for cy in 0..rows {
            for cx in 0..cols {
                if grid.cell_bounds(cx, cy).intersects(&aabb) {
                    out.push((cx, cy));
                }
            }
        }
        out
    }

    fn reported_cells(grid: &SpatialGrid, id: EntityId) -> Vec<(usize, usize)> {
        let (cols, rows) = grid.dimensions();
        let mut out = Vec::new();
        for cy in 0..rows {
            for cx in 0..cols {
                if grid.entities_in_cell(cx, cy).contains(&id) {
                    out.push((cx, cy));
                }
            }
        }
        out
    }

    #[test]
    fn test_membership_matches_aabb_after_random_ops() {
        let mut grid = SpatialGrid::new(640.0, 640.0, 64.0);
        let mut rng = StdRng::seed_from_u64(7);
        let mut dots: Vec<Dot> = (0..20)
            .map(|id| dot(id, rng.random_range(40.0..600.0), rng.random_range(40.0..600.0), 15.0))
            .collect();
        grid.bulk_insert(dots.iter());

        for step in 0..500 {
            let i = rng.random_range(0..dots.len());
            match step % 5 {
                0 => {
                    grid.remove(dots[i].id);
                    assert!(reported_cells(&grid, dots[i].id).is_empty());
                    grid.insert(&dots[i]);
                }
                _ => {
                    dots[i].pos.x = (dots[i].pos.x + rng.random_range(-40.0..40.0)).clamp(40.0, 600.0);
                    dots[i].pos.y = (dots[i].pos.y + rng.random_range(-40.0..40.0)).clamp(40.0, 600.0);
                    dots[i].radius = rng.random_range(5.0..40.0);
                    grid.update(&dots[i]);
                }
            }
        }

        for d in &dots {
            assert_eq!(reported_cells(&grid, d.id), expected_cells(&grid, d), "entity {}", d.id);
        }
    }

    #[test]
    fn test_update_unchanged_is_noop() {
        let mut grid = SpatialGrid::new(640.0, 640.0, 64.0);
        let mut d = dot(1, 100.0, 100.0, 10.0);
        grid.insert(&d);
        let before = grid.cells_of(1);

        assert!(!grid.update(&d));
        assert!(!grid.update(&d));
        d.pos.x += 2.0; // still inside the same cell
        assert!(!grid.update(&d));
        assert_eq!(grid.cells_of(1), before);
        assert_eq!(grid.entities_in_cell(1, 1), &[1]);

        d.pos.x = 300.0;
        assert!(grid.update(&d));
        assert!(grid.entities_in_cell(1, 1).is_empty());
    }

    #[test]
    fn test_nearby_excludes_self() {
        let mut grid = SpatialGrid::new(640.0, 640.0, 64.0);
        grid.insert(&dot(1, 100.0, 100.0, 10.0));
        grid.insert(&dot(2, 110.0, 100.0, 10.0));
        grid.insert(&dot(3, 500.0, 500.0, 10.0));

        assert_eq!(grid.get_nearby_entities(1), vec![2]);
        assert_eq!(grid.query_area(100.0, 100.0, 20.0), vec![1, 2]);
        assert!(grid.get_nearby_entities(99).is_empty());
    }

    #[test]
    fn test_off_map_queries_clamp_to_edges() {
        let mut grid = SpatialGrid::new(640.0, 640.0, 64.0);
        grid.insert(&dot(1, 10.0, 10.0, 5.0));
        assert_eq!(grid.query_area(-500.0, -500.0, 5.0), vec![1]);
        grid.set_cell_flags(0, 0, TileType::Wall, None);
        // Off-map disc lands in the corner cell bucket but not its real box.
        assert!(!grid.check_wall_collision(Vec2::new(-500.0, -500.0), 5.0));
        assert!(grid.check_wall_collision(Vec2::new(70.0, 30.0), 10.0));
    }

    #[test]
    fn test_terrain_flags_use_true_cell_box() {
        let mut grid = SpatialGrid::new(640.0, 640.0, 64.0);
        grid.set_cell_flags(2, 2, TileType::Wall, None);
        // AABB edge touches x = 128 exactly: not an overlap.
        assert!(!grid.check_wall_collision(Vec2::new(118.0, 150.0), 10.0));
        assert!(grid.check_wall_collision(Vec2::new(119.0, 150.0), 10.0));
    }

    #[test]
    fn test_spawn_validity() {
        let mut grid = SpatialGrid::new(640.0, 640.0, 64.0);
        grid.set_cell_flags(0, 0, TileType::SafeSpawn, None);
        grid.set_cell_flags(1, 0, TileType::SafeZone, None);
        grid.set_cell_flags(2, 0, TileType::Teleporter, None);

        assert!(grid.is_valid_spawn_position(32.0, 32.0, 20.0));
        assert!(!grid.is_valid_spawn_position(96.0, 32.0, 20.0));
        assert!(!grid.is_valid_spawn_position(160.0, 32.0, 20.0));
        assert!(!grid.is_valid_spawn_position(5.0, 32.0, 20.0));
    }

    #[test]
    fn test_teleporter_inside_and_outside() {
        let mut grid = SpatialGrid::new(640.0, 640.0, 64.0);
        let a = TeleporterInfo { code: "A".into(), destination: "arena".into() };
        let b = TeleporterInfo { code: "B".into(), destination: "arena".into() };
        grid.set_cell_flags(5, 5, TileType::Teleporter, Some(a.clone()));
        grid.set_cell_flags(6, 5, TileType::Teleporter, Some(a.clone()));
        grid.set_cell_flags(5, 7, TileType::Teleporter, Some(a.clone()));
        grid.set_cell_flags(6, 7, TileType::Teleporter, Some(b));

        let center = Vec2::new(5.5 * 64.0, 5.5 * 64.0);
        assert_eq!(grid.teleporter_containing(center, 25.0), Some(&a));
        // Straddling two same-code cells still counts as inside.
        assert!(grid.is_fully_inside_teleporter(Vec2::new(384.0, 352.0), 25.0));
        // Straddling a teleporter and floor does not.
        assert!(!grid.is_fully_inside_teleporter(Vec2::new(352.0, 384.0), 25.0));
        // Straddling two codes does not.
        assert!(!grid.is_fully_inside_teleporter(Vec2::new(384.0, 480.0), 25.0));

        assert!(!grid.is_fully_outside_teleporter(Vec2::new(352.0, 384.0), 25.0));
        assert!(grid.is_fully_outside_teleporter(Vec2::new(352.0, 410.0), 25.0));
    }

    #[test]
    fn test_clear_keeps_terrain() {
        let mut grid = SpatialGrid::new(640.0, 640.0, 64.0);
        grid.set_cell_flags(0, 0, TileType::Wall, None);
        grid.insert(&dot(1, 100.0, 100.0, 10.0));
        grid.clear();
        assert!(grid.is_empty());
        assert!(grid.query_area(100.0, 100.0, 10.0).is_empty());
        assert!(grid.check_wall_collision(Vec2::new(32.0, 32.0), 5.0));
    }
}
