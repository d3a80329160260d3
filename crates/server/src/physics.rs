//! Motion and collision resolution.
//!
//! Every moving entity advances through `resolve_motion`: axis-separated
//! moves against the grid's static terrain and the world bounds, with
//! reflection and jitter on contact for bouncing bodies and plain blocking
//! for sliding ones. The circle test used by the cross-entity collision
//! pass lives here too.

use crate::entity::Body;
use crate::spatial::SpatialGrid;
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

/// Velocity noise added after a single-axis reflection.
pub const AXIS_JITTER: f32 = 0.2;
/// Velocity noise added after the composed-move fallback.
pub const CORNER_JITTER: f32 = 0.5;

/// Which static terrain a body treats as solid. World bounds always are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blocking {
    pub walls: bool,
    pub safe_zones: bool,
    pub teleporters: bool,
}

impl Blocking {
    /// Enemies and projectiles stay out of walls, safe zones and teleporters.
    pub const ENEMY: Blocking = Blocking {
        walls: true,
        safe_zones: true,
        teleporters: true,
    };
    /// Players only collide with walls.
    pub const PLAYER: Blocking = Blocking {
        walls: true,
        safe_zones: false,
        teleporters: false,
    };
}

/// What happens to the velocity when a move is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Reflect, jitter and re-normalize to the body's speed.
    Bounce,
    /// Drop the blocked component for this tick, keep the velocity.
    Slide,
}

/// Result of one resolver step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    pub moved: bool,
    /// At least one component was reflected.
    pub bounced: bool,
}

/// True if a disc at `pos` leaves the world or overlaps masked terrain.
#[inline]
pub fn is_blocked(grid: &SpatialGrid, pos: Vec2, radius: f32, mask: Blocking) -> bool {
    !grid.in_bounds(pos, radius)
        || (mask.walls && grid.check_wall_collision(pos, radius))
        || (mask.safe_zones && grid.check_safe_zone_collision(pos, radius))
        || (mask.teleporters && grid.check_teleporter_collision(pos, radius))
}

#[inline]
fn jitter<R: Rng + ?Sized>(velocity: &mut Vec2, magnitude: f32, rng: &mut R) {
    velocity.x += rng.random_range(-magnitude..=magnitude);
    velocity.y += rng.random_range(-magnitude..=magnitude);
}

/// Scale the velocity back to `speed`, picking a random heading when it
/// has collapsed to zero.
pub fn renormalize<R: Rng + ?Sized>(velocity: &mut Vec2, speed: f32, rng: &mut R) {
    let len = velocity.length();
    if len > f32::EPSILON {
        *velocity *= speed / len;
    } else {
        let angle = rng.random_range(0.0..TAU);
        *velocity = Vec2::from_angle(angle) * speed;
    }
}

/// Advance `body` by its velocity scaled by `time_scale`.
///
/// X is tried alone, then Y, each from the original step. The composed
/// position is checked once more against terrain and bounds; if it is
/// still invalid the body goes back to where it started. The grid is
/// updated when the position changed.
pub fn resolve_motion<R: Rng + ?Sized>(
    body: &mut Body,
    grid: &mut SpatialGrid,
    time_scale: f32,
    response: Response,
    mask: Blocking,
    rng: &mut R,
) -> MoveOutcome {
    let start = body.position;
    let step = body.velocity * time_scale;
    let radius = body.radius;
    let mut pos = start;
    let mut bounced = false;

    if step.x != 0.0 {
        let candidate = Vec2::new(pos.x + step.x, pos.y);
        if is_blocked(grid, candidate, radius, mask) {
            if response == Response::Bounce {
                body.velocity.x = -body.velocity.x;
                jitter(&mut body.velocity, AXIS_JITTER, rng);
                bounced = true;
            }
        } else {
            pos = candidate;
        }
    }

    if step.y != 0.0 {
        let candidate = Vec2::new(pos.x, pos.y + step.y);
        if is_blocked(grid, candidate, radius, mask) {
            if response == Response::Bounce {
                body.velocity.y = -body.velocity.y;
                jitter(&mut body.velocity, AXIS_JITTER, rng);
                bounced = true;
            }
        } else {
            pos = candidate;
        }
    }

    if pos != start && is_blocked(grid, pos, radius, mask) {
        pos = start;
        if response == Response::Bounce {
            body.velocity = -body.velocity;
            jitter(&mut body.velocity, CORNER_JITTER, rng);
            bounced = true;
        }
    }

    if bounced {
        renormalize(&mut body.velocity, body.speed, rng);
    }

    body.position = pos;
    let moved = pos != start;
    if moved {
        grid.update(body);
    }

    MoveOutcome { moved, bounced }
}

/// Result of checking two discs against each other.
#[derive(Debug, Clone, Copy)]
pub struct CollisionResult {
    /// Sum of both radii.
    pub r: f32,
    /// Centre distance.
    pub d: f32,
}

impl CollisionResult {
    #[inline]
    pub fn is_colliding(&self) -> bool {
        self.d < self.r
    }
}

#[inline]
pub fn check_circle_collision(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> CollisionResult {
    CollisionResult {
        r: a_radius + b_radius,
        d: a.distance(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;
    use crate::map::TileType;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn boxed_grid() -> SpatialGrid {
        // 10x10 cells of 64px with a wall ring.
        let mut grid = SpatialGrid::new(640.0, 640.0, 64.0);
        for i in 0..10 {
            grid.set_cell_flags(i, 0, TileType::Wall, None);
            grid.set_cell_flags(i, 9, TileType::Wall, None);
            grid.set_cell_flags(0, i, TileType::Wall, None);
            grid.set_cell_flags(9, i, TileType::Wall, None);
        }
        grid
    }

    fn body(x: f32, y: f32, vx: f32, vy: f32) -> Body {
        let mut b = Body::new(1, EntityType::Enemy, Vec2::new(x, y), 15.0);
        b.velocity = Vec2::new(vx, vy);
        b.speed = b.velocity.length();
        b
    }

    #[test]
    fn test_free_move_updates_grid() {
        let mut grid = boxed_grid();
        let mut rng = StdRng::seed_from_u64(1);
        let mut b = body(200.0, 200.0, 3.0, 4.0);
        grid.insert(&b);

        let out = resolve_motion(&mut b, &mut grid, 1.0, Response::Bounce, Blocking::ENEMY, &mut rng);
        assert!(out.moved && !out.bounced);
        assert_eq!(b.position, Vec2::new(203.0, 204.0));

        let out = resolve_motion(&mut b, &mut grid, 2.0, Response::Bounce, Blocking::ENEMY, &mut rng);
        assert!(out.moved);
        assert_eq!(b.position, Vec2::new(209.0, 212.0));
        assert!(grid.contains(1));
    }

    #[test]
    fn test_blocked_axis_reflects_and_keeps_speed() {
        let mut grid = boxed_grid();
        let mut rng = StdRng::seed_from_u64(2);
        // Right wall starts at x = 576; one step right would overlap it.
        let mut b = body(558.0, 300.0, 5.0, 1.0);
        grid.insert(&b);
        let speed = b.speed;

        let out = resolve_motion(&mut b, &mut grid, 1.0, Response::Bounce, Blocking::ENEMY, &mut rng);
        assert!(out.bounced);
        assert_eq!(b.position.x, 558.0);
        assert_eq!(b.position.y, 301.0);
        assert!(b.velocity.x < 0.0);
        assert!((b.velocity.length() - speed).abs() < 1e-4);
    }

    #[test]
    fn test_slide_keeps_velocity() {
        let mut grid = boxed_grid();
        let mut rng = StdRng::seed_from_u64(3);
        let mut b = body(558.0, 300.0, 5.0, 5.0);
        let out = resolve_motion(&mut b, &mut grid, 1.0, Response::Slide, Blocking::PLAYER, &mut rng);
        assert!(out.moved && !out.bounced);
        assert_eq!(b.position, Vec2::new(558.0, 305.0));
        assert_eq!(b.velocity, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_safe_zone_blocks_enemy_only() {
        let mut grid = SpatialGrid::new(640.0, 640.0, 64.0);
        grid.set_cell_flags(4, 4, TileType::SafeZone, None);
        assert!(is_blocked(&grid, Vec2::new(288.0, 288.0), 10.0, Blocking::ENEMY));
        assert!(!is_blocked(&grid, Vec2::new(288.0, 288.0), 10.0, Blocking::PLAYER));
        assert!(is_blocked(&grid, Vec2::new(5.0, 288.0), 10.0, Blocking::PLAYER));
    }

    #[test]
    fn test_speed_holds_over_many_bounces() {
        let mut grid = boxed_grid();
        let mut rng = StdRng::seed_from_u64(4);
        let mut b = body(300.0, 300.0, 6.0, 2.5);
        grid.insert(&b);
        let speed = b.speed;
        let mut bounces = 0;
        for _ in 0..2000 {
            let out = resolve_motion(&mut b, &mut grid, 1.0, Response::Bounce, Blocking::ENEMY, &mut rng);
            if out.bounced {
                bounces += 1;
            }
            assert!((b.velocity.length() - speed).abs() < 1e-3);
            assert!(!is_blocked(&grid, b.position, b.radius, Blocking::ENEMY));
        }
        assert!(bounces > 0);
    }

    #[test]
    fn test_zero_velocity_gets_random_heading() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut v = Vec2::ZERO;
        renormalize(&mut v, 3.0, &mut rng);
        assert!((v.length() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_circle_collision() {
        let hit = check_circle_collision(Vec2::new(100.0, 100.0), 25.0, Vec2::new(130.0, 100.0), 15.0);
        assert!(hit.is_colliding());
        assert_eq!(hit.d, 30.0);
        let miss = check_circle_collision(Vec2::ZERO, 10.0, Vec2::new(100.0, 0.0), 10.0);
        assert!(!miss.is_colliding());
    }
}
