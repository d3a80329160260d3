//! Entity snapshot records.
//!
//! These are the compact per-entity records the simulation hands to the
//! network layer every tick. Id remapping and compression happen further
//! down the pipe; this module only fixes the record shapes and a plain
//! little-endian frame layout.

use crate::{BinaryWriter, Color};
use bytes::Bytes;
use serde::Serialize;

/// Opcode of a map snapshot frame.
pub const SNAPSHOT_OPCODE: u8 = 0x10;

/// Player state as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRecord {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color: Color,
    pub is_dead: bool,
    pub current_map_id: String,
}

/// Variant-specific enemy fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum EnemyDetail {
    Basic,
    Sniper {
        detection_radius: f32,
        shooting_radius: f32,
        cooldown: u32,
    },
    Dasher {
        phase: u8,
        time_elapsed: f32,
        time_to_idle: f32,
        time_to_prepare: f32,
        time_to_dash: f32,
    },
    Homing {
        angle: f32,
        target_angle: f32,
    },
    VoidCrawler {
        phase: u8,
        time_elapsed: f32,
        angle: f32,
    },
    Wall {
        direction: u8,
        clockwise: bool,
        /// left, top, right, bottom
        boundary: [f32; 4],
    },
    RecursiveBulletBoss {
        rotation: f32,
        cooldown: u32,
    },
}

impl EnemyDetail {
    fn tag(&self) -> u8 {
        match self {
            EnemyDetail::Basic => 0,
            EnemyDetail::Sniper { .. } => 1,
            EnemyDetail::Dasher { .. } => 2,
            EnemyDetail::Homing { .. } => 3,
            EnemyDetail::VoidCrawler { .. } => 4,
            EnemyDetail::Wall { .. } => 5,
            EnemyDetail::RecursiveBulletBoss { .. } => 6,
        }
    }

    fn write(&self, w: &mut BinaryWriter) {
        w.put_u8(self.tag());
        match *self {
            EnemyDetail::Basic => {}
            EnemyDetail::Sniper {
                detection_radius,
                shooting_radius,
                cooldown,
            } => {
                w.put_f32(detection_radius);
                w.put_f32(shooting_radius);
                w.put_u32(cooldown);
            }
            EnemyDetail::Dasher {
                phase,
                time_elapsed,
                time_to_idle,
                time_to_prepare,
                time_to_dash,
            } => {
                w.put_u8(phase);
                w.put_f32(time_elapsed);
                w.put_f32(time_to_idle);
                w.put_f32(time_to_prepare);
                w.put_f32(time_to_dash);
            }
            EnemyDetail::Homing { angle, target_angle } => {
                w.put_f32(angle);
                w.put_f32(target_angle);
            }
            EnemyDetail::VoidCrawler {
                phase,
                time_elapsed,
                angle,
            } => {
                w.put_u8(phase);
                w.put_f32(time_elapsed);
                w.put_f32(angle);
            }
            EnemyDetail::Wall {
                direction,
                clockwise,
                boundary,
            } => {
                w.put_u8(direction);
                w.put_bool(clockwise);
                for edge in boundary {
                    w.put_f32(edge);
                }
            }
            EnemyDetail::RecursiveBulletBoss { rotation, cooldown } => {
                w.put_f32(rotation);
                w.put_u32(cooldown);
            }
        }
    }
}

/// Enemy state as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnemyRecord {
    pub id: u32,
    /// Numeric enemy type tag.
    pub kind: u8,
    pub x: f32,
    pub y: f32,
    pub prev_x: f32,
    pub prev_y: f32,
    pub radius: f32,
    pub color: Color,
    pub detail: EnemyDetail,
}

/// Projectile state as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulletRecord {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub prev_x: f32,
    pub prev_y: f32,
    pub radius: f32,
    pub is_active: bool,
    /// Only present for recursive bullets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursion_level: Option<u8>,
}

/// Everything a client on one map needs for one tick.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MapSnapshot {
    pub tick: u64,
    pub map_id: String,
    pub players: Vec<PlayerRecord>,
    pub enemies: Vec<EnemyRecord>,
    pub bullets: Vec<BulletRecord>,
}

impl MapSnapshot {
    /// Encode the snapshot as a single binary frame.
    ///
    /// Layout: opcode, tick, map id, then three `u16`-counted record lists
    /// (players, enemies, bullets).
    pub fn encode(&self) -> Bytes {
        let mut w = BinaryWriter::with_capacity(
            16 + self.map_id.len()
                + self.players.len() * 32
                + self.enemies.len() * 52
                + self.bullets.len() * 26,
        );
        w.put_u8(SNAPSHOT_OPCODE);
        w.put_u64(self.tick);
        w.put_string_utf8(&self.map_id);

        w.put_u16(self.players.len() as u16);
        for p in &self.players {
            w.put_u32(p.id);
            w.put_f32(p.x);
            w.put_f32(p.y);
            w.put_f32(p.radius);
            w.put_u8(p.color.r);
            w.put_u8(p.color.g);
            w.put_u8(p.color.b);
            w.put_bool(p.is_dead);
            w.put_string_utf8(&p.current_map_id);
        }

        w.put_u16(self.enemies.len() as u16);
        for e in &self.enemies {
            w.put_u32(e.id);
            w.put_u8(e.kind);
            w.put_f32(e.x);
            w.put_f32(e.y);
            w.put_f32(e.prev_x);
            w.put_f32(e.prev_y);
            w.put_f32(e.radius);
            w.put_u8(e.color.r);
            w.put_u8(e.color.g);
            w.put_u8(e.color.b);
            e.detail.write(&mut w);
        }

        w.put_u16(self.bullets.len() as u16);
        for b in &self.bullets {
            w.put_u32(b.id);
            w.put_f32(b.x);
            w.put_f32(b.y);
            w.put_f32(b.prev_x);
            w.put_f32(b.prev_y);
            w.put_f32(b.radius);
            let mut flags = 0u8;
            if b.is_active {
                flags |= 0x01;
            }
            if b.recursion_level.is_some() {
                flags |= 0x02;
            }
            w.put_u8(flags);
            if let Some(level) = b.recursion_level {
                w.put_u8(level);
            }
        }

        w.finish()
    }
}
