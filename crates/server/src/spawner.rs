//! Enemy placement when a map loads.

use crate::config::{EnemyParams, EnemySpawnConfig};
use crate::entity::enemy::{
    Basic, Dasher, EnemyBehavior, Homing, RecursiveBulletBoss, Sniper, VoidCrawler, Wall,
};
use crate::entity::{Enemy, IdAllocator};
use crate::map::{Region, TileMap, TileType};
use crate::spatial::SpatialGrid;
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;
use tracing::{debug, warn};

/// Calls to `get_valid_spawn_position` per enemy before it is skipped.
const SPAWN_RETRIES: usize = 10;

/// Place every configured enemy group on `map` and register them with
/// `grid`. Enemies that find no valid position are skipped.
pub fn spawn_enemies<R: Rng + ?Sized>(
    map: &TileMap,
    grid: &mut SpatialGrid,
    groups: &[EnemySpawnConfig],
    ids: &mut IdAllocator,
    rng: &mut R,
) -> Vec<Enemy> {
    let mut enemies = Vec::new();
    let mut regions: Option<Vec<Region>> = None;

    for group in groups {
        for i in 0..group.count {
            let speed = random_speed(group.min_speed, group.max_speed, rng);
            let angle = rng.random_range(0.0..TAU);

            let (position, behavior) = match &group.params {
                EnemyParams::Wall(params) => {
                    let regions = regions.get_or_insert_with(|| map.find_connected_regions(TileType::Floor));
                    let region = match params.region {
                        Some(idx) => regions.get(idx),
                        None => regions.iter().max_by_key(|r| r.len()),
                    };
                    let Some(region) = region else {
                        warn!("Map {} has no floor region for wall enemies, skipping", map.id());
                        break;
                    };
                    let boundary = region.bounds(map.tile_size());
                    let inner = boundary.inset(group.radius);
                    let perimeter = 2.0 * (inner.width() + inner.height());
                    let distance = i as f32 * perimeter / group.count as f32;
                    let (wall, pos) = Wall::place(boundary, group.radius, params.start_side, params.clockwise, distance);
                    (pos, EnemyBehavior::Wall(wall))
                }
                params => {
                    let Some(pos) = find_position(map, grid, group.radius, rng) else {
                        warn!(
                            "No valid spawn position for {} enemy on map {}, skipping",
                            kind_name(params),
                            map.id()
                        );
                        continue;
                    };
                    (pos, free_behavior(params, angle, speed))
                }
            };

            let enemy = Enemy::new(ids.next_id(), position, group.radius, speed, angle, behavior);
            enemies.push(enemy);
        }
    }

    grid.bulk_insert(enemies.iter().map(|e| &e.body));
    debug!("Spawned {} enemies on map {}", enemies.len(), map.id());
    enemies
}

fn random_speed<R: Rng + ?Sized>(min: f32, max: f32, rng: &mut R) -> f32 {
    if max > min {
        rng.random_range(min..=max)
    } else {
        min
    }
}

/// A floor position clear of walls, teleporters and both safe zone kinds.
fn find_position<R: Rng + ?Sized>(
    map: &TileMap,
    grid: &SpatialGrid,
    radius: f32,
    rng: &mut R,
) -> Option<Vec2> {
    (0..SPAWN_RETRIES).find_map(|_| {
        map.get_valid_spawn_position(TileType::Floor, radius, grid, rng)
            .filter(|&pos| !grid.check_safe_zone_collision(pos, radius))
    })
}

fn free_behavior(params: &EnemyParams, angle: f32, speed: f32) -> EnemyBehavior {
    match params {
        EnemyParams::Basic => EnemyBehavior::Basic(Basic),
        EnemyParams::Sniper(p) => EnemyBehavior::Sniper(Sniper::new(p.clone())),
        EnemyParams::Dasher(p) => EnemyBehavior::Dasher(Dasher::new(p.clone(), Vec2::from_angle(angle), speed)),
        EnemyParams::Homing(p) => EnemyBehavior::Homing(Homing::new(p.clone(), angle)),
        EnemyParams::VoidCrawler(p) => EnemyBehavior::VoidCrawler(VoidCrawler::new(p.clone(), angle, speed)),
        EnemyParams::RecursiveBulletBoss(p) => {
            EnemyBehavior::RecursiveBulletBoss(RecursiveBulletBoss::new(p.clone()))
        }
        // Placed on their region perimeter by the caller.
        EnemyParams::Wall(_) => EnemyBehavior::Basic(Basic),
    }
}

fn kind_name(params: &EnemyParams) -> &'static str {
    match params {
        EnemyParams::Basic => "basic",
        EnemyParams::Sniper(_) => "sniper",
        EnemyParams::Dasher(_) => "dasher",
        EnemyParams::Homing(_) => "homing",
        EnemyParams::VoidCrawler(_) => "void_crawler",
        EnemyParams::Wall(_) => "wall",
        EnemyParams::RecursiveBulletBoss(_) => "recursive_bullet_boss",
    }
}
