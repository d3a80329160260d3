//! Projectiles.

use super::{Body, EntityId, EntityType, IdAllocator};
use crate::physics::{self, Blocking};
use crate::spatial::SpatialGrid;
use glam::Vec2;
use protocol::BulletRecord;

/// Scale factors applied to each child generation of a recursive bullet.
const CHILD_RADIUS_FACTOR: f32 = 0.8;
const CHILD_SPEED_FACTOR: f32 = 0.9;
const CHILD_LIFESPAN_FACTOR: f32 = 0.8;

/// Linear projectile.
///
/// Deactivates on terrain or world bounds, or on the first player it hits.
#[derive(Debug, Clone)]
pub struct Bullet {
    pub body: Body,
    pub is_active: bool,
}

impl Bullet {
    /// A bullet at `position` flying towards `target`.
    pub fn aimed(id: EntityId, position: Vec2, target: Vec2, radius: f32, speed: f32) -> Self {
        let dir = (target - position).normalize_or(Vec2::X);
        Self::with_direction(id, position, dir, radius, speed)
    }

    pub fn with_direction(id: EntityId, position: Vec2, dir: Vec2, radius: f32, speed: f32) -> Self {
        let mut body = Body::new(id, EntityType::Bullet, position, radius);
        body.speed = speed;
        body.velocity = dir * speed;
        Self {
            body,
            is_active: true,
        }
    }

    pub fn update(&mut self, grid: &mut SpatialGrid, time_scale: f32) {
        if self.is_active {
            advance(&mut self.body, &mut self.is_active, grid, time_scale);
        }
    }

    pub fn serialize(&self) -> BulletRecord {
        record(&self.body, self.is_active, None)
    }
}

/// Projectile that forks into a smaller copy of itself after a delay.
#[derive(Debug, Clone)]
pub struct RecursiveBullet {
    pub body: Body,
    pub is_active: bool,
    /// Remaining fork generations.
    pub recursion_level: u8,
    /// Ticks before the bullet expires on its own.
    pub lifespan: u32,
    /// Ticks before the bullet forks.
    pub fire_delay: u32,
    pub ticks_alive: u32,
}

impl RecursiveBullet {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: EntityId,
        position: Vec2,
        dir: Vec2,
        radius: f32,
        speed: f32,
        recursion_level: u8,
        lifespan: u32,
        fire_delay: u32,
    ) -> Self {
        let mut body = Body::new(id, EntityType::RecursiveBullet, position, radius);
        body.speed = speed;
        body.velocity = dir.normalize_or(Vec2::X) * speed;
        Self {
            body,
            is_active: true,
            recursion_level,
            lifespan,
            fire_delay,
            ticks_alive: 0,
        }
    }

    /// Move one tick. The child, if one is forked this tick, is pushed to
    /// `spawned`.
    pub fn update(
        &mut self,
        grid: &mut SpatialGrid,
        time_scale: f32,
        ids: &mut IdAllocator,
        spawned: &mut Vec<Projectile>,
    ) {
        if !self.is_active {
            return;
        }
        self.ticks_alive += 1;
        advance(&mut self.body, &mut self.is_active, grid, time_scale);

        if self.is_active && self.recursion_level > 0 && self.ticks_alive == self.fire_delay {
            spawned.push(Projectile::Recursive(self.fork(ids.next_id())));
        }

        if self.is_active && self.ticks_alive >= self.lifespan {
            deactivate(&self.body, &mut self.is_active, grid);
        }
    }

    /// Child bullet continuing along the current heading.
    fn fork(&self, id: EntityId) -> RecursiveBullet {
        let dir = self.body.velocity.normalize_or(Vec2::X);
        RecursiveBullet::new(
            id,
            self.body.position,
            dir,
            self.body.radius * CHILD_RADIUS_FACTOR,
            self.body.speed * CHILD_SPEED_FACTOR,
            self.recursion_level - 1,
            (self.lifespan as f32 * CHILD_LIFESPAN_FACTOR) as u32,
            self.fire_delay,
        )
    }

    pub fn serialize(&self) -> BulletRecord {
        record(&self.body, self.is_active, Some(self.recursion_level))
    }
}

fn advance(body: &mut Body, is_active: &mut bool, grid: &mut SpatialGrid, time_scale: f32) {
    body.begin_step();
    body.position += body.velocity * time_scale;
    if physics::is_blocked(grid, body.position, body.radius, Blocking::ENEMY) {
        deactivate(body, is_active, grid);
    } else {
        grid.update(body);
    }
}

fn deactivate(body: &Body, is_active: &mut bool, grid: &mut SpatialGrid) {
    *is_active = false;
    grid.remove(body.id);
}

fn record(body: &Body, is_active: bool, recursion_level: Option<u8>) -> BulletRecord {
    BulletRecord {
        id: body.id,
        x: body.position.x,
        y: body.position.y,
        prev_x: body.prev_position.x,
        prev_y: body.prev_position.y,
        radius: body.radius,
        is_active,
        recursion_level,
    }
}

/// Any projectile owned by a map runtime.
#[derive(Debug, Clone)]
pub enum Projectile {
    Bullet(Bullet),
    Recursive(RecursiveBullet),
}

impl Projectile {
    #[inline]
    pub fn body(&self) -> &Body {
        match self {
            Projectile::Bullet(b) => &b.body,
            Projectile::Recursive(b) => &b.body,
        }
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.body().id
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        match self {
            Projectile::Bullet(b) => b.is_active,
            Projectile::Recursive(b) => b.is_active,
        }
    }

    pub fn update(
        &mut self,
        grid: &mut SpatialGrid,
        time_scale: f32,
        ids: &mut IdAllocator,
        spawned: &mut Vec<Projectile>,
    ) {
        match self {
            Projectile::Bullet(b) => b.update(grid, time_scale),
            Projectile::Recursive(b) => b.update(grid, time_scale, ids, spawned),
        }
    }

    /// Hit a player: the projectile is spent.
    pub fn deactivate(&mut self, grid: &mut SpatialGrid) {
        match self {
            Projectile::Bullet(b) => deactivate(&b.body, &mut b.is_active, grid),
            Projectile::Recursive(b) => deactivate(&b.body, &mut b.is_active, grid),
        }
    }

    pub fn serialize(&self) -> BulletRecord {
        match self {
            Projectile::Bullet(b) => b.serialize(),
            Projectile::Recursive(b) => b.serialize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::TileType;

    fn open_grid() -> SpatialGrid {
        SpatialGrid::new(10_000.0, 10_000.0, 64.0)
    }

    #[test]
    fn test_bullet_deactivates_on_wall() {
        let mut grid = open_grid();
        grid.set_cell_flags(3, 1, TileType::Wall, None);
        let mut b = Bullet::aimed(1, Vec2::new(100.0, 96.0), Vec2::new(500.0, 96.0), 8.0, 10.0);
        grid.insert(&b.body);

        for _ in 0..10 {
            b.update(&mut grid, 1.0);
        }
        assert!(!b.is_active);
        assert!(!grid.contains(1));
        assert!(b.body.position.x < 200.0);
    }

    #[test]
    fn test_bullet_leaves_world() {
        let mut grid = SpatialGrid::new(200.0, 200.0, 64.0);
        let mut b = Bullet::with_direction(1, Vec2::new(100.0, 100.0), Vec2::NEG_Y, 5.0, 30.0);
        grid.insert(&b.body);
        for _ in 0..5 {
            b.update(&mut grid, 1.0);
        }
        assert!(!b.is_active);
        assert!(!b.serialize().is_active);
    }

    #[test]
    fn test_recursive_bullet_forks_once_at_delay() {
        let mut grid = open_grid();
        let mut ids = IdAllocator::default();
        let mut spawned = Vec::new();
        let mut b = RecursiveBullet::new(
            ids.next_id(),
            Vec2::new(5_000.0, 5_000.0),
            Vec2::X,
            10.0,
            4.0,
            2,
            100,
            15,
        );
        grid.insert(&b.body);

        for _ in 0..14 {
            b.update(&mut grid, 1.0, &mut ids, &mut spawned);
        }
        assert!(spawned.is_empty());

        b.update(&mut grid, 1.0, &mut ids, &mut spawned);
        assert_eq!(spawned.len(), 1);

        for _ in 0..30 {
            b.update(&mut grid, 1.0, &mut ids, &mut spawned);
        }
        assert_eq!(spawned.len(), 1);

        let Projectile::Recursive(child) = &spawned[0] else {
            panic!("expected a recursive child");
        };
        assert!((child.body.radius - 8.0).abs() < 1e-5);
        assert!((child.body.speed - 3.6).abs() < 1e-5);
        assert_eq!(child.recursion_level, 1);
        assert_eq!(child.lifespan, 80);
        assert_eq!(child.fire_delay, 15);
        assert!(child.body.velocity.x > 0.0);
        assert_eq!(child.serialize().recursion_level, Some(1));
    }

    #[test]
    fn test_recursive_bullet_expires() {
        let mut grid = open_grid();
        let mut ids = IdAllocator::default();
        let mut spawned = Vec::new();
        let mut b = RecursiveBullet::new(1, Vec2::new(100.0, 5_000.0), Vec2::X, 10.0, 1.0, 0, 20, 5);
        grid.insert(&b.body);
        for _ in 0..19 {
            b.update(&mut grid, 1.0, &mut ids, &mut spawned);
        }
        assert!(b.is_active);
        b.update(&mut grid, 1.0, &mut ids, &mut spawned);
        assert!(!b.is_active);
        assert!(spawned.is_empty());
        assert!(!grid.contains(1));
    }
}
