//! Per-map simulation state.
//!
//! A `MapRuntime` owns the grid, enemies and projectiles of one loaded map.
//! Players are not owned here: they carry a map id and are registered in the
//! grid of whichever runtime they are currently on.

use crate::clock::TickTime;
use crate::entity::enemy::{EnemyContext, PlayerView};
use crate::entity::{Enemy, EntityId, IdAllocator, Projectile};
use crate::map::{MapDefinition, TileMap};
use crate::physics;
use crate::spatial::SpatialGrid;
use crate::spawner;
use glam::Vec2;
use protocol::{MapSnapshot, PlayerRecord};
use rand::{Rng, RngCore};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// One loaded map.
#[derive(Debug)]
pub struct MapRuntime {
    pub map: Arc<TileMap>,
    pub grid: SpatialGrid,
    pub enemies: BTreeMap<EntityId, Enemy>,
    pub bullets: BTreeMap<EntityId, Projectile>,
    /// Simulated time of the last access.
    last_accessed: Duration,
}

impl MapRuntime {
    /// Build the grid from the map tiles and spawn the configured enemies.
    pub fn load<R: Rng + ?Sized>(
        def: &MapDefinition,
        ids: &mut IdAllocator,
        rng: &mut R,
        now: Duration,
    ) -> Self {
        let mut grid = SpatialGrid::from_map(&def.map, def.cell_size);
        let enemies = spawner::spawn_enemies(&def.map, &mut grid, &def.enemies, ids, rng)
            .into_iter()
            .map(|e| (e.id(), e))
            .collect();

        Self {
            map: Arc::clone(&def.map),
            grid,
            enemies,
            bullets: BTreeMap::new(),
            last_accessed: now,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        self.map.id()
    }

    #[inline]
    pub fn touch(&mut self, now: Duration) {
        self.last_accessed = now;
    }

    #[inline]
    pub fn last_accessed(&self) -> Duration {
        self.last_accessed
    }

    /// True once more than `timeout` has passed since the last access.
    #[inline]
    pub fn is_idle(&self, now: Duration, timeout: Duration) -> bool {
        now.saturating_sub(self.last_accessed) > timeout
    }

    /// Register a projectile with the grid and the bullet set.
    pub fn add_projectile(&mut self, projectile: Projectile) {
        self.grid.insert(projectile.body());
        self.bullets.insert(projectile.id(), projectile);
    }

    /// Run every enemy for one tick. Projectiles they fire join the bullet
    /// set right away.
    pub fn update_enemies(
        &mut self,
        time: TickTime,
        players: &[PlayerView],
        ids: &mut IdAllocator,
        rng: &mut dyn RngCore,
    ) {
        let mut spawned = Vec::new();
        let mut ctx = EnemyContext {
            time,
            players,
            ids,
            spawned: &mut spawned,
            rng,
        };
        for enemy in self.enemies.values_mut() {
            enemy.update(&mut self.grid, &mut ctx);
        }
        for projectile in spawned {
            self.add_projectile(projectile);
        }
    }

    /// Move every projectile, add forked children and drop spent ones.
    pub fn update_bullets(&mut self, time_scale: f32, ids: &mut IdAllocator) {
        let mut spawned = Vec::new();
        for bullet in self.bullets.values_mut() {
            bullet.update(&mut self.grid, time_scale, ids, &mut spawned);
        }
        self.drop_inactive_bullets();
        for projectile in spawned {
            self.add_projectile(projectile);
        }
    }

    pub fn drop_inactive_bullets(&mut self) {
        let grid = &mut self.grid;
        self.bullets.retain(|id, b| {
            if !b.is_active() {
                grid.remove(*id);
            }
            b.is_active()
        });
    }

    /// First enemy or active projectile overlapping the disc. A projectile
    /// that hits is spent.
    pub fn collide_player(&mut self, pos: Vec2, radius: f32, margin: f32) -> Option<EntityId> {
        for id in self.grid.query_area(pos.x, pos.y, radius + margin) {
            if let Some(enemy) = self.enemies.get(&id) {
                if physics::check_circle_collision(pos, radius, enemy.body.position, enemy.body.radius)
                    .is_colliding()
                {
                    return Some(id);
                }
            } else if let Some(bullet) = self.bullets.get_mut(&id) {
                let body = bullet.body();
                if bullet.is_active()
                    && physics::check_circle_collision(pos, radius, body.position, body.radius)
                        .is_colliding()
                {
                    bullet.deactivate(&mut self.grid);
                    return Some(id);
                }
            }
        }
        None
    }

    /// Drop every dynamic entity. Static terrain stays with the map.
    pub fn teardown(&mut self) {
        self.grid.clear();
        self.enemies.clear();
        self.bullets.clear();
    }

    /// Snapshot of this map for the network layer, enemies and bullets in id
    /// order.
    pub fn snapshot(&self, tick: u64, players: Vec<PlayerRecord>) -> MapSnapshot {
        MapSnapshot {
            tick,
            map_id: self.id().to_string(),
            players,
            enemies: self.enemies.values().map(Enemy::serialize).collect(),
            bullets: self.bullets.values().map(Projectile::serialize).collect(),
        }
    }
}
