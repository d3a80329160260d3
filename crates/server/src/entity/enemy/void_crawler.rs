use super::homing::{steer, take_bounce};
use super::{Behavior, EnemyContext, EnemyKind, Motion, Phase, PhaseCycle};
use crate::config::VoidCrawlerParams;
use crate::entity::Body;
use crate::physics::MoveOutcome;
use protocol::EnemyDetail;

/// Homing steering on a dasher-like speed cycle. The lurch decays with a
/// fifth-power curve.
#[derive(Debug, Clone)]
pub struct VoidCrawler {
    pub params: VoidCrawlerParams,
    pub cycle: PhaseCycle,
    pub angle: f32,
    pub target_angle: f32,
    pub normal_speed: f32,
}

impl VoidCrawler {
    pub fn new(params: VoidCrawlerParams, angle: f32, normal_speed: f32) -> Self {
        let cycle = PhaseCycle::new(params.time_to_idle, params.time_to_prepare, params.time_to_lurch);
        Self {
            params,
            cycle,
            angle,
            target_angle: angle,
            normal_speed,
        }
    }

    pub fn current_speed(&self) -> f32 {
        match self.cycle.phase {
            Phase::Idle => self.normal_speed,
            Phase::Preparing => self.params.prepare_speed * self.cycle.remaining(),
            Phase::Active => self.params.lurch_speed * self.cycle.remaining().powi(5),
        }
    }
}

impl Behavior for VoidCrawler {
    fn kind(&self) -> EnemyKind {
        EnemyKind::VoidCrawler
    }

    fn think(&mut self, body: &mut Body, ctx: &mut EnemyContext<'_>) -> Motion {
        self.cycle.advance(ctx.time.dt_ms);
        steer(
            &mut self.angle,
            &mut self.target_angle,
            body,
            ctx,
            self.params.home_range,
            self.params.turn_rate,
        );
        body.speed = self.current_speed();
        body.set_heading(self.angle);
        Motion::Free
    }

    fn after_move(&mut self, body: &Body, outcome: MoveOutcome) {
        take_bounce(&mut self.angle, &mut self.target_angle, body, outcome);
    }

    fn detail(&self) -> EnemyDetail {
        EnemyDetail::VoidCrawler {
            phase: self.cycle.phase as u8,
            time_elapsed: self.cycle.elapsed,
            angle: self.angle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::Harness;
    use super::super::{Enemy, EnemyBehavior, PlayerView};
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_lurch_snaps_then_fades() {
        let params = VoidCrawlerParams {
            time_to_idle: 100.0,
            time_to_prepare: 100.0,
            time_to_lurch: 1000.0,
            prepare_speed: 1.0,
            lurch_speed: 16.0,
            home_range: 700.0,
            turn_rate: 0.05,
        };
        let mut crawler = VoidCrawler::new(params, 0.0, 2.0);
        crawler.cycle.advance(100.0);
        crawler.cycle.advance(100.0);
        assert_eq!(crawler.cycle.phase, Phase::Active);
        assert!((crawler.current_speed() - 16.0).abs() < 1e-4);
        crawler.cycle.advance(500.0);
        assert!((crawler.current_speed() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_steers_towards_player() {
        let mut h = Harness::new();
        let crawler = VoidCrawler::new(VoidCrawlerParams::default(), 0.0, 2.0);
        let mut enemy = Enemy::new(1, Vec2::new(400.0, 400.0), 18.0, 2.0, 0.0, EnemyBehavior::VoidCrawler(crawler));
        h.grid.insert(&enemy.body);
        h.players.push(PlayerView { id: 5, position: Vec2::new(400.0, 900.0), radius: 25.0, protected: false });
        h.run(&mut enemy, 20);
        let EnemyBehavior::VoidCrawler(c) = &enemy.behavior else { unreachable!() };
        assert!(c.angle > 0.5);
        assert!(enemy.body.position.y > 400.0);
    }
}
