//! Simulation entities.
//!
//! Every entity wraps a `Body` (id, position, radius, velocity) and adds its
//! own state on top: players, the seven enemy behaviors, and projectiles.

mod bullet;
pub mod enemy;
mod player;

pub use bullet::{Bullet, Projectile, RecursiveBullet};
pub use enemy::{Enemy, EnemyKind};
pub use player::Player;

use crate::spatial::Spatial;
use glam::Vec2;

pub type EntityId = u32;

/// Entity type tag.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Player = 0,
    Enemy = 1,
    Bullet = 2,
    RecursiveBullet = 3,
}

/// Kinematic state shared by every entity.
#[derive(Debug, Clone)]
pub struct Body {
    pub id: EntityId,
    pub entity_type: EntityType,
    pub position: Vec2,
    /// Position at the start of the last update, for client interpolation.
    pub prev_position: Vec2,
    pub radius: f32,
    /// Pixels per nominal tick.
    pub velocity: Vec2,
    /// Current target speed. The resolver re-normalizes to this after a
    /// bounce.
    pub speed: f32,
}

impl Body {
    pub fn new(id: EntityId, entity_type: EntityType, position: Vec2, radius: f32) -> Self {
        Self {
            id,
            entity_type,
            position,
            prev_position: position,
            radius,
            velocity: Vec2::ZERO,
            speed: 0.0,
        }
    }

    /// Point the velocity along `angle` at the current speed.
    #[inline]
    pub fn set_heading(&mut self, angle: f32) {
        self.velocity = Vec2::from_angle(angle) * self.speed;
    }

    /// Heading angle of the velocity, if it is moving.
    #[inline]
    pub fn heading(&self) -> Option<f32> {
        if self.velocity.length_squared() > f32::EPSILON {
            Some(self.velocity.y.atan2(self.velocity.x))
        } else {
            None
        }
    }

    /// Remember the current position as the previous one.
    #[inline]
    pub fn begin_step(&mut self) {
        self.prev_position = self.position;
    }
}

impl Spatial for Body {
    #[inline]
    fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    fn radius(&self) -> f32 {
        self.radius
    }
}

/// Hands out entity ids. Zero is never used.
#[derive(Debug)]
pub struct IdAllocator {
    next: EntityId,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    #[inline]
    pub fn next_id(&mut self) -> EntityId {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        if self.next == 0 {
            self.next = 1;
        }
        id
    }
}
