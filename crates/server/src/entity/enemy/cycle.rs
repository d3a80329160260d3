//! Shared helpers for the timed and steering behaviors.

use super::PlayerView;
use glam::Vec2;
use std::f32::consts::TAU;

/// Angular error below which steering stops correcting.
pub const ANGLE_EPSILON: f32 = 0.01;

/// Phase of a three-step speed cycle.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle = 0,
    Preparing = 1,
    /// Dashing or lurching.
    Active = 2,
}

impl Phase {
    #[inline]
    fn next(self) -> Self {
        match self {
            Phase::Idle => Phase::Preparing,
            Phase::Preparing => Phase::Active,
            Phase::Active => Phase::Idle,
        }
    }
}

/// Idle, preparing, active, repeat. Each phase lasts a fixed number of
/// milliseconds of simulated time.
#[derive(Debug, Clone)]
pub struct PhaseCycle {
    pub phase: Phase,
    /// Milliseconds spent in the current phase.
    pub elapsed: f32,
    durations: [f32; 3],
}

impl PhaseCycle {
    pub fn new(idle: f32, preparing: f32, active: f32) -> Self {
        Self {
            phase: Phase::Idle,
            elapsed: 0.0,
            durations: [idle.max(0.0), preparing.max(0.0), active.max(0.0)],
        }
    }

    #[inline]
    pub fn duration(&self, phase: Phase) -> f32 {
        self.durations[phase as usize]
    }

    /// Add `dt_ms` and move to the next phase when the current one is used
    /// up. At most one transition per call; the overshoot carries over.
    pub fn advance(&mut self, dt_ms: f32) -> bool {
        self.elapsed += dt_ms;
        let limit = self.duration(self.phase);
        if self.elapsed >= limit {
            self.elapsed = (self.elapsed - limit).max(0.0);
            self.phase = self.phase.next();
            true
        } else {
            false
        }
    }

    /// Fraction of the current phase left, from 1 down to 0.
    #[inline]
    pub fn remaining(&self) -> f32 {
        let limit = self.duration(self.phase);
        if limit <= 0.0 {
            0.0
        } else {
            (1.0 - self.elapsed / limit).clamp(0.0, 1.0)
        }
    }
}

/// Signed shortest angle from `from` to `to`, in `[-PI, PI]`.
#[inline]
pub fn angle_difference(from: f32, to: f32) -> f32 {
    let d = to - from;
    d.sin().atan2(d.cos())
}

/// Rotate `angle` towards `target` by at most `max_step`, never past it.
pub fn turn_towards(angle: f32, target: f32, max_step: f32) -> f32 {
    let diff = angle_difference(angle, target);
    if diff.abs() < ANGLE_EPSILON {
        return angle;
    }
    (angle + diff.clamp(-max_step, max_step)).rem_euclid(TAU)
}

/// Closest player within `range` of `from`, optionally skipping players on
/// protected tiles.
pub fn nearest_player<'a>(
    players: &'a [PlayerView],
    from: Vec2,
    range: f32,
    skip_protected: bool,
) -> Option<&'a PlayerView> {
    let range_sq = range * range;
    players
        .iter()
        .filter(|p| !(skip_protected && p.protected))
        .map(|p| (p, p.position.distance_squared(from)))
        .filter(|&(_, d)| d <= range_sq)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(p, _)| p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_cycle_wraps() {
        let mut c = PhaseCycle::new(100.0, 50.0, 200.0);
        assert!(!c.advance(60.0));
        assert!(c.advance(60.0));
        assert_eq!(c.phase, Phase::Preparing);
        assert!((c.elapsed - 20.0).abs() < 1e-4);
        assert!((c.remaining() - 0.6).abs() < 1e-4);
        assert!(c.advance(30.0));
        assert!(c.advance(200.0));
        assert_eq!(c.phase, Phase::Idle);
    }

    #[test]
    fn test_turn_never_overshoots() {
        let a = turn_towards(0.0, 0.05, 0.1);
        assert!((a - 0.05).abs() < 1e-5);
        let a = turn_towards(0.0, 1.0, 0.1);
        assert!((a - 0.1).abs() < 1e-5);
        // Shortest way round: from just below TAU towards 0.1 goes up.
        let a = turn_towards(TAU - 0.1, 0.1, 0.05);
        assert!((a - (TAU - 0.05)).abs() < 1e-4);
        assert_eq!(turn_towards(1.0, 1.005, 0.1), 1.0);
        assert!((angle_difference(PI - 0.1, -PI + 0.1) - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_nearest_player_skips_protected() {
        let players = [
            PlayerView { id: 1, position: Vec2::new(10.0, 0.0), radius: 25.0, protected: true },
            PlayerView { id: 2, position: Vec2::new(50.0, 0.0), radius: 25.0, protected: false },
            PlayerView { id: 3, position: Vec2::new(500.0, 0.0), radius: 25.0, protected: false },
        ];
        assert_eq!(nearest_player(&players, Vec2::ZERO, 100.0, false).map(|p| p.id), Some(1));
        assert_eq!(nearest_player(&players, Vec2::ZERO, 100.0, true).map(|p| p.id), Some(2));
        assert!(nearest_player(&players, Vec2::ZERO, 5.0, false).is_none());
    }
}
