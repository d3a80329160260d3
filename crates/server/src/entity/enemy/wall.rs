use super::{Behavior, EnemyContext, EnemyKind, Motion};
use crate::config::Side;
use crate::entity::Body;
use crate::spatial::Bounds;
use glam::Vec2;
use protocol::EnemyDetail;
use tracing::warn;

/// Upper bound on edge walks when placing a wall on its perimeter.
const PLACEMENT_ITERATION_CAP: usize = 64;

/// Edge direction of a patrolling wall, in screen coordinates (y down).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    #[inline]
    pub fn vector(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::NEG_Y,
            Direction::Right => Vec2::X,
            Direction::Down => Vec2::Y,
            Direction::Left => Vec2::NEG_X,
        }
    }

    #[inline]
    pub fn rotate(self, clockwise: bool) -> Self {
        match (self, clockwise) {
            (Direction::Up, true) | (Direction::Down, false) => Direction::Right,
            (Direction::Right, true) | (Direction::Left, false) => Direction::Down,
            (Direction::Down, true) | (Direction::Up, false) => Direction::Left,
            (Direction::Left, true) | (Direction::Right, false) => Direction::Up,
        }
    }

    /// Distance from `pos` to the edge of `area` ahead.
    #[inline]
    fn room_ahead(self, area: &Bounds, pos: Vec2) -> f32 {
        let d = match self {
            Direction::Up => pos.y - area.min_y,
            Direction::Right => area.max_x - pos.x,
            Direction::Down => area.max_y - pos.y,
            Direction::Left => pos.x - area.min_x,
        };
        d.max(0.0)
    }
}

/// Patrols the perimeter of a rectangular boundary.
#[derive(Debug, Clone)]
pub struct Wall {
    pub direction: Direction,
    pub clockwise: bool,
    pub boundary: Bounds,
}

impl Wall {
    /// Place a wall `distance` pixels along the perimeter, starting at the
    /// beginning of `side` in the patrol direction. Returns the wall and its
    /// starting position.
    pub fn place(boundary: Bounds, radius: f32, side: Side, clockwise: bool, distance: f32) -> (Self, Vec2) {
        Self::place_with_cap(boundary, radius, side, clockwise, distance, PLACEMENT_ITERATION_CAP)
    }

    /// `place` with at most `cap` edge walks.
    pub(crate) fn place_with_cap(
        boundary: Bounds,
        radius: f32,
        side: Side,
        clockwise: bool,
        distance: f32,
        cap: usize,
    ) -> (Self, Vec2) {
        let area = boundary.inset(radius);
        let (mut pos, mut direction) = match (side, clockwise) {
            (Side::Top, true) => (Vec2::new(area.min_x, area.min_y), Direction::Right),
            (Side::Right, true) => (Vec2::new(area.max_x, area.min_y), Direction::Down),
            (Side::Bottom, true) => (Vec2::new(area.max_x, area.max_y), Direction::Left),
            (Side::Left, true) => (Vec2::new(area.min_x, area.max_y), Direction::Up),
            (Side::Top, false) => (Vec2::new(area.max_x, area.min_y), Direction::Left),
            (Side::Left, false) => (Vec2::new(area.min_x, area.min_y), Direction::Down),
            (Side::Bottom, false) => (Vec2::new(area.min_x, area.max_y), Direction::Right),
            (Side::Right, false) => (Vec2::new(area.max_x, area.max_y), Direction::Up),
        };

        let perimeter = 2.0 * (area.width() + area.height());
        let mut remaining = if perimeter > 0.0 {
            distance.rem_euclid(perimeter)
        } else {
            0.0
        };

        let mut iterations = 0;
        while remaining > 0.0 {
            if iterations >= cap {
                warn!(
                    "Wall placement hit iteration cap ({} left of {} perimeter), stopping at ({:.1}, {:.1})",
                    remaining, perimeter, pos.x, pos.y
                );
                break;
            }
            iterations += 1;

            let room = direction.room_ahead(&area, pos);
            if remaining <= room {
                pos += direction.vector() * remaining;
                break;
            }
            pos += direction.vector() * room;
            remaining -= room;
            direction = direction.rotate(clockwise);
        }

        (
            Self {
                direction,
                clockwise,
                boundary,
            },
            clamp_to(&area, pos),
        )
    }

    /// Advance along the perimeter, turning at corners.
    fn patrol(&mut self, body: &mut Body, time_scale: f32) {
        let area = self.boundary.inset(body.radius);
        let mut pos = clamp_to(&area, body.position);
        let mut remaining = body.speed * time_scale;

        for _ in 0..4 {
            let room = self.direction.room_ahead(&area, pos);
            if remaining <= room {
                pos += self.direction.vector() * remaining;
                break;
            }
            pos += self.direction.vector() * room;
            remaining -= room;
            self.direction = self.direction.rotate(self.clockwise);
        }

        body.position = clamp_to(&area, pos);
        body.velocity = self.direction.vector() * body.speed;
    }
}

#[inline]
fn clamp_to(area: &Bounds, pos: Vec2) -> Vec2 {
    Vec2::new(
        pos.x.clamp(area.min_x, area.max_x),
        pos.y.clamp(area.min_y, area.max_y),
    )
}

impl Behavior for Wall {
    fn kind(&self) -> EnemyKind {
        EnemyKind::Wall
    }

    fn think(&mut self, body: &mut Body, ctx: &mut EnemyContext<'_>) -> Motion {
        self.patrol(body, ctx.time.time_scale);
        Motion::Scripted
    }

    fn detail(&self) -> EnemyDetail {
        EnemyDetail::Wall {
            direction: self.direction as u8,
            clockwise: self.clockwise,
            boundary: [
                self.boundary.min_x,
                self.boundary.min_y,
                self.boundary.max_x,
                self.boundary.max_y,
            ],
        }
    }
}
