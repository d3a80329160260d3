use super::{Behavior, EnemyContext, EnemyKind, Motion, nearest_player};
use crate::config::SniperParams;
use crate::entity::{Body, Bullet, Projectile};
use protocol::EnemyDetail;

/// Wanders like a basic enemy and shoots at the nearest player in range.
#[derive(Debug, Clone)]
pub struct Sniper {
    pub params: SniperParams,
    /// Ticks until the next shot is allowed.
    pub cooldown: u32,
}

impl Sniper {
    pub fn new(params: SniperParams) -> Self {
        Self { params, cooldown: 0 }
    }
}

impl Behavior for Sniper {
    fn kind(&self) -> EnemyKind {
        EnemyKind::Sniper
    }

    fn think(&mut self, body: &mut Body, ctx: &mut EnemyContext<'_>) -> Motion {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return Motion::Free;
        }

        let target = nearest_player(ctx.players, body.position, self.params.detection_radius, false)
            .filter(|p| p.position.distance(body.position) <= self.params.shooting_radius);
        if let Some(target) = target {
            let bullet = Bullet::aimed(
                ctx.ids.next_id(),
                body.position,
                target.position,
                self.params.bullet_radius,
                self.params.bullet_speed,
            );
            ctx.spawned.push(Projectile::Bullet(bullet));
            self.cooldown = self.params.cooldown_ticks;
        }
        Motion::Free
    }

    fn detail(&self) -> EnemyDetail {
        EnemyDetail::Sniper {
            detection_radius: self.params.detection_radius,
            shooting_radius: self.params.shooting_radius,
            cooldown: self.cooldown,
        }
    }
}
