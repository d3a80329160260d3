use super::{Behavior, EnemyContext, EnemyKind, Motion, Phase, PhaseCycle};
use crate::config::DasherParams;
use crate::entity::Body;
use crate::physics::MoveOutcome;
use glam::Vec2;
use protocol::EnemyDetail;

/// Cruises, slows down to wind up, then dashes and decelerates to a stop.
///
/// The heading is fixed between bounces; only the speed follows the cycle.
#[derive(Debug, Clone)]
pub struct Dasher {
    pub params: DasherParams,
    pub cycle: PhaseCycle,
    /// Unit heading.
    pub heading: Vec2,
    /// Speed while idle.
    pub normal_speed: f32,
}

impl Dasher {
    pub fn new(params: DasherParams, heading: Vec2, normal_speed: f32) -> Self {
        let cycle = PhaseCycle::new(params.time_to_idle, params.time_to_prepare, params.time_to_dash);
        Self {
            params,
            cycle,
            heading: heading.normalize_or(Vec2::X),
            normal_speed,
        }
    }

    /// Target speed for the current phase and elapsed time.
    pub fn current_speed(&self) -> f32 {
        match self.cycle.phase {
            Phase::Idle => self.normal_speed,
            Phase::Preparing => self.params.prepare_speed * self.cycle.remaining(),
            Phase::Active => self.params.dash_speed * self.cycle.remaining(),
        }
    }
}

impl Behavior for Dasher {
    fn kind(&self) -> EnemyKind {
        EnemyKind::Dasher
    }

    fn think(&mut self, body: &mut Body, ctx: &mut EnemyContext<'_>) -> Motion {
        self.cycle.advance(ctx.time.dt_ms);
        body.speed = self.current_speed();
        body.velocity = self.heading * body.speed;
        Motion::Free
    }

    fn after_move(&mut self, body: &Body, outcome: MoveOutcome) {
        if outcome.bounced {
            self.heading = body.velocity.normalize_or(self.heading);
        }
    }

    fn detail(&self) -> EnemyDetail {
        EnemyDetail::Dasher {
            phase: self.cycle.phase as u8,
            time_elapsed: self.cycle.elapsed,
            time_to_idle: self.params.time_to_idle,
            time_to_prepare: self.params.time_to_prepare,
            time_to_dash: self.params.time_to_dash,
        }
    }
}
