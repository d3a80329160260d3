use super::{Behavior, EnemyContext, EnemyKind, Motion, nearest_player, turn_towards};
use crate::config::HomingParams;
use crate::entity::Body;
use crate::physics::MoveOutcome;
use protocol::EnemyDetail;

/// Steers towards the nearest unprotected player in range.
#[derive(Debug, Clone)]
pub struct Homing {
    pub params: HomingParams,
    pub angle: f32,
    pub target_angle: f32,
}

impl Homing {
    pub fn new(params: HomingParams, angle: f32) -> Self {
        Self {
            params,
            angle,
            target_angle: angle,
        }
    }
}

/// Retarget on the nearest unprotected player in range, then turn by at
/// most `turn_rate` per nominal tick.
pub(super) fn steer(
    angle: &mut f32,
    target_angle: &mut f32,
    body: &Body,
    ctx: &EnemyContext<'_>,
    home_range: f32,
    turn_rate: f32,
) {
    if let Some(target) = nearest_player(ctx.players, body.position, home_range, true) {
        let d = target.position - body.position;
        *target_angle = d.y.atan2(d.x);
    }
    *angle = turn_towards(*angle, *target_angle, turn_rate * ctx.time.time_scale);
}

/// After a bounce the reflected velocity becomes the new heading.
pub(super) fn take_bounce(angle: &mut f32, target_angle: &mut f32, body: &Body, outcome: MoveOutcome) {
    if outcome.bounced {
        if let Some(heading) = body.heading() {
            *angle = heading;
            *target_angle = heading;
        }
    }
}

impl Behavior for Homing {
    fn kind(&self) -> EnemyKind {
        EnemyKind::Homing
    }

    fn think(&mut self, body: &mut Body, ctx: &mut EnemyContext<'_>) -> Motion {
        steer(
            &mut self.angle,
            &mut self.target_angle,
            body,
            ctx,
            self.params.home_range,
            self.params.turn_rate,
        );
        body.set_heading(self.angle);
        Motion::Free
    }

    fn after_move(&mut self, body: &Body, outcome: MoveOutcome) {
        take_bounce(&mut self.angle, &mut self.target_angle, body, outcome);
    }

    fn detail(&self) -> EnemyDetail {
        EnemyDetail::Homing {
            angle: self.angle,
            target_angle: self.target_angle,
        }
    }
}
