//! Enemy behaviors.
//!
//! An `Enemy` is a `Body` plus one of seven behaviors. Each tick the
//! behavior sets the body's velocity (and may fire projectiles), then the
//! body moves: free movers go through the shared bouncing resolver, scripted
//! movers place themselves.

mod basic;
mod boss;
mod cycle;
mod dasher;
mod homing;
mod kind;
mod sniper;
mod void_crawler;
mod wall;

pub use basic::Basic;
pub use boss::RecursiveBulletBoss;
pub use cycle::{Phase, PhaseCycle, angle_difference, nearest_player, turn_towards};
pub use dasher::Dasher;
pub use homing::Homing;
pub use kind::{EnemyKind, KindInfo};
pub use sniper::Sniper;
pub use void_crawler::VoidCrawler;
pub use wall::{Direction, Wall};

use super::{Body, EntityId, EntityType, IdAllocator, Projectile};
use crate::clock::TickTime;
use crate::physics::{self, Blocking, MoveOutcome, Response};
use crate::spatial::SpatialGrid;
use glam::Vec2;
use protocol::{EnemyDetail, EnemyRecord};
use rand::RngCore;

/// What an enemy needs to know about a living player on its map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    pub id: EntityId,
    pub position: Vec2,
    pub radius: f32,
    /// Standing on a safe zone or teleporter.
    pub protected: bool,
}

/// Per-tick inputs shared by every enemy on a map.
pub struct EnemyContext<'a> {
    pub time: TickTime,
    pub players: &'a [PlayerView],
    pub ids: &'a mut IdAllocator,
    /// Projectiles fired this tick.
    pub spawned: &'a mut Vec<Projectile>,
    pub rng: &'a mut dyn RngCore,
}

/// How the body moves after `think`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// Through the bouncing resolver.
    Free,
    /// The behavior already placed the body.
    Scripted,
}

/// Per-variant enemy logic.
pub trait Behavior {
    fn kind(&self) -> EnemyKind;

    /// Update internal state and the body's velocity for this tick.
    fn think(&mut self, body: &mut Body, ctx: &mut EnemyContext<'_>) -> Motion;

    /// Called after a free move.
    fn after_move(&mut self, _body: &Body, _outcome: MoveOutcome) {}

    fn detail(&self) -> EnemyDetail;
}

/// The seven behaviors.
#[derive(Debug, Clone)]
pub enum EnemyBehavior {
    Basic(Basic),
    Sniper(Sniper),
    Dasher(Dasher),
    Homing(Homing),
    VoidCrawler(VoidCrawler),
    Wall(Wall),
    RecursiveBulletBoss(RecursiveBulletBoss),
}

impl EnemyBehavior {
    #[inline]
    fn as_behavior(&self) -> &dyn Behavior {
        match self {
            EnemyBehavior::Basic(b) => b,
            EnemyBehavior::Sniper(b) => b,
            EnemyBehavior::Dasher(b) => b,
            EnemyBehavior::Homing(b) => b,
            EnemyBehavior::VoidCrawler(b) => b,
            EnemyBehavior::Wall(b) => b,
            EnemyBehavior::RecursiveBulletBoss(b) => b,
        }
    }

    #[inline]
    fn as_behavior_mut(&mut self) -> &mut dyn Behavior {
        match self {
            EnemyBehavior::Basic(b) => b,
            EnemyBehavior::Sniper(b) => b,
            EnemyBehavior::Dasher(b) => b,
            EnemyBehavior::Homing(b) => b,
            EnemyBehavior::VoidCrawler(b) => b,
            EnemyBehavior::Wall(b) => b,
            EnemyBehavior::RecursiveBulletBoss(b) => b,
        }
    }
}

/// An enemy on a map.
#[derive(Debug, Clone)]
pub struct Enemy {
    pub body: Body,
    pub behavior: EnemyBehavior,
}

impl Enemy {
    /// An enemy at `position` moving along `angle` at `speed`.
    pub fn new(
        id: EntityId,
        position: Vec2,
        radius: f32,
        speed: f32,
        angle: f32,
        behavior: EnemyBehavior,
    ) -> Self {
        let mut body = Body::new(id, EntityType::Enemy, position, radius);
        body.speed = speed;
        body.set_heading(angle);
        Self { body, behavior }
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.body.id
    }

    #[inline]
    pub fn kind(&self) -> EnemyKind {
        self.behavior.as_behavior().kind()
    }

    /// Run one tick: think, then move.
    pub fn update(&mut self, grid: &mut SpatialGrid, ctx: &mut EnemyContext<'_>) {
        self.body.begin_step();
        let behavior = self.behavior.as_behavior_mut();
        match behavior.think(&mut self.body, ctx) {
            Motion::Free => {
                let outcome = physics::resolve_motion(
                    &mut self.body,
                    grid,
                    ctx.time.time_scale,
                    Response::Bounce,
                    Blocking::ENEMY,
                    &mut *ctx.rng,
                );
                behavior.after_move(&self.body, outcome);
            }
            Motion::Scripted => {
                if self.body.position != self.body.prev_position {
                    grid.update(&self.body);
                }
            }
        }
    }

    pub fn serialize(&self) -> EnemyRecord {
        let kind = self.kind();
        EnemyRecord {
            id: self.body.id,
            kind: kind.tag(),
            x: self.body.position.x,
            y: self.body.position.y,
            prev_x: self.body.prev_position.x,
            prev_y: self.body.prev_position.y,
            radius: self.body.radius,
            color: kind.color(),
            detail: self.behavior.as_behavior().detail(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::map::TileType;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// 20x20 cells of 64px with a wall ring.
    pub(crate) fn arena() -> SpatialGrid {
        let mut grid = SpatialGrid::new(1280.0, 1280.0, 64.0);
        for i in 0..20 {
            grid.set_cell_flags(i, 0, TileType::Wall, None);
            grid.set_cell_flags(i, 19, TileType::Wall, None);
            grid.set_cell_flags(0, i, TileType::Wall, None);
            grid.set_cell_flags(19, i, TileType::Wall, None);
        }
        grid
    }

    /// Runs `ticks` nominal ticks of one enemy against a fixed player list.
    pub(crate) struct Harness {
        pub grid: SpatialGrid,
        pub ids: IdAllocator,
        pub spawned: Vec<Projectile>,
        pub rng: StdRng,
        pub players: Vec<PlayerView>,
    }

    impl Harness {
        pub(crate) fn new() -> Self {
            Self {
                grid: arena(),
                ids: IdAllocator::default(),
                spawned: Vec::new(),
                rng: StdRng::seed_from_u64(11),
                players: Vec::new(),
            }
        }

        pub(crate) fn step(&mut self, enemy: &mut Enemy, dt_ms: f32) {
            let mut ctx = EnemyContext {
                time: TickTime {
                    dt_ms,
                    time_scale: dt_ms / (1000.0 / 60.0),
                },
                players: &self.players,
                ids: &mut self.ids,
                spawned: &mut self.spawned,
                rng: &mut self.rng,
            };
            enemy.update(&mut self.grid, &mut ctx);
        }

        pub(crate) fn run(&mut self, enemy: &mut Enemy, ticks: usize) {
            for _ in 0..ticks {
                self.step(enemy, 1000.0 / 60.0);
            }
        }
    }

    #[test]
    fn test_serialize_uses_kind_table() {
        let enemy = Enemy::new(
            4,
            Vec2::new(300.0, 300.0),
            15.0,
            3.0,
            0.0,
            EnemyBehavior::Basic(Basic),
        );
        let rec = enemy.serialize();
        assert_eq!(rec.kind, EnemyKind::Basic.tag());
        assert_eq!(rec.color, EnemyKind::Basic.color());
        assert_eq!(rec.detail, EnemyDetail::Basic);
        assert_eq!((rec.x, rec.y), (300.0, 300.0));
    }

    #[test]
    fn test_prev_position_tracks_last_step() {
        let mut h = Harness::new();
        let mut enemy = Enemy::new(
            1,
            Vec2::new(300.0, 300.0),
            15.0,
            3.0,
            0.0,
            EnemyBehavior::Basic(Basic),
        );
        h.grid.insert(&enemy.body);
        h.run(&mut enemy, 1);
        let rec = enemy.serialize();
        assert_eq!((rec.prev_x, rec.prev_y), (300.0, 300.0));
        assert!((rec.x - 303.0).abs() < 1e-4);
    }
}
