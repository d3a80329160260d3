//! Player entity.

use super::{Body, EntityId, EntityType};
use glam::Vec2;
use protocol::{Color, PlayerRecord};

/// A connected player or a bot.
///
/// Players are not owned by a map runtime. They carry the id of the map
/// they are on and are looked up against that runtime every tick.
#[derive(Debug, Clone)]
pub struct Player {
    pub body: Body,
    pub name: String,
    pub color: Color,
    pub is_dead: bool,
    pub current_map_id: String,
    /// Movement intent, at most unit length.
    pub input: Vec2,
    /// Set once the player has been fully outside every teleporter since
    /// the last teleport.
    pub can_teleport: bool,
    /// Ticks until another teleport may trigger.
    pub teleport_cooldown: u32,
    pub is_bot: bool,
}

impl Player {
    pub fn new(
        id: EntityId,
        name: String,
        map_id: String,
        position: Vec2,
        radius: f32,
        speed: f32,
        color: Color,
    ) -> Self {
        let mut body = Body::new(id, EntityType::Player, position, radius);
        body.speed = speed;
        Self {
            body,
            name,
            color,
            is_dead: false,
            current_map_id: map_id,
            input: Vec2::ZERO,
            can_teleport: false,
            teleport_cooldown: 0,
            is_bot: false,
        }
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.body.id
    }

    /// Store movement intent, clamped to unit length.
    pub fn set_input(&mut self, direction: Vec2) {
        self.input = if direction.is_finite() {
            direction.clamp_length_max(1.0)
        } else {
            Vec2::ZERO
        };
    }

    /// Derive this tick's velocity from the input. Dead players stand still.
    pub fn apply_input(&mut self) {
        self.body.velocity = if self.is_dead {
            Vec2::ZERO
        } else {
            self.input * self.body.speed
        };
    }

    #[inline]
    pub fn kill(&mut self) {
        self.is_dead = true;
        self.body.velocity = Vec2::ZERO;
    }

    #[inline]
    pub fn revive(&mut self) {
        self.is_dead = false;
    }

    pub fn serialize(&self) -> PlayerRecord {
        PlayerRecord {
            id: self.body.id,
            x: self.body.position.x,
            y: self.body.position.y,
            radius: self.body.radius,
            color: self.color,
            is_dead: self.is_dead,
            current_map_id: self.current_map_id.clone(),
        }
    }
}
