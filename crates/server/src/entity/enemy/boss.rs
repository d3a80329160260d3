use super::{Behavior, EnemyContext, EnemyKind, Motion};
use crate::config::BossParams;
use crate::entity::{Body, Projectile, RecursiveBullet};
use glam::Vec2;
use protocol::EnemyDetail;
use std::f32::consts::TAU;

/// Slow wanderer that fires rotating rings of recursive bullets.
#[derive(Debug, Clone)]
pub struct RecursiveBulletBoss {
    pub params: BossParams,
    /// Offset of the next ring, in radians.
    pub rotation: f32,
    /// Ticks until the next ring.
    pub cooldown: u32,
}

impl RecursiveBulletBoss {
    pub fn new(params: BossParams) -> Self {
        let cooldown = params.cooldown_ticks;
        Self {
            params,
            rotation: 0.0,
            cooldown,
        }
    }

    fn fire(&self, body: &Body, ctx: &mut EnemyContext<'_>) {
        let count = self.params.bullet_count.max(1);
        let step = TAU / count as f32;
        for i in 0..count {
            let dir = Vec2::from_angle(self.rotation + i as f32 * step);
            let bullet = RecursiveBullet::new(
                ctx.ids.next_id(),
                body.position,
                dir,
                self.params.bullet_radius,
                self.params.bullet_speed,
                self.params.recursion_level,
                self.params.lifespan,
                self.params.fire_delay,
            );
            ctx.spawned.push(Projectile::Recursive(bullet));
        }
    }
}

impl Behavior for RecursiveBulletBoss {
    fn kind(&self) -> EnemyKind {
        EnemyKind::RecursiveBulletBoss
    }

    fn think(&mut self, body: &mut Body, ctx: &mut EnemyContext<'_>) -> Motion {
        self.rotation = (self.rotation + self.params.rotation_speed * ctx.time.time_scale).rem_euclid(TAU);
        if self.cooldown > 0 {
            self.cooldown -= 1;
        } else {
            self.fire(body, ctx);
            self.cooldown = self.params.cooldown_ticks;
        }
        Motion::Free
    }

    fn detail(&self) -> EnemyDetail {
        EnemyDetail::RecursiveBulletBoss {
            rotation: self.rotation,
            cooldown: self.cooldown,
        }
    }
}
