use super::{Behavior, EnemyContext, EnemyKind, Motion};
use crate::entity::Body;
use protocol::EnemyDetail;

/// Moves in a straight line and bounces off terrain.
#[derive(Debug, Clone, Copy, Default)]
pub struct Basic;

impl Behavior for Basic {
    fn kind(&self) -> EnemyKind {
        EnemyKind::Basic
    }

    fn think(&mut self, _body: &mut Body, _ctx: &mut EnemyContext<'_>) -> Motion {
        Motion::Free
    }

    fn detail(&self) -> EnemyDetail {
        EnemyDetail::Basic
    }
}
