//! Simulation clock.
//!
//! One `TickTime` is produced per global tick and handed to every update
//! call, so all entities in a tick scale their motion by the same factor.

use crate::config::{SimulationConfig, TimeScaleMode};
use std::time::{Duration, Instant};

/// Time step of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickTime {
    /// Simulated milliseconds covered by this tick.
    pub dt_ms: f32,
    /// `dt_ms` relative to the nominal tick. Velocities are per nominal
    /// tick and get multiplied by this.
    pub time_scale: f32,
}

impl TickTime {
    /// A step of exactly one nominal tick.
    pub fn nominal(nominal_tick_ms: f32) -> Self {
        Self {
            dt_ms: nominal_tick_ms,
            time_scale: 1.0,
        }
    }
}

/// Produces the per-tick time step and tracks simulated time.
#[derive(Debug)]
pub struct TickClock {
    mode: TimeScaleMode,
    nominal_ms: f32,
    max_time_scale: f32,
    last: Option<Instant>,
    /// Simulated time since the clock started.
    elapsed: Duration,
}

impl TickClock {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            mode: config.time_scale,
            nominal_ms: config.nominal_tick_ms.max(0.001),
            max_time_scale: config.max_time_scale.max(1.0),
            last: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn advance(&mut self) -> TickTime {
        self.advance_at(Instant::now())
    }

    /// Advance the clock as if the tick started at `now`.
    pub fn advance_at(&mut self, now: Instant) -> TickTime {
        let dt_ms = match (self.mode, self.last) {
            (TimeScaleMode::Measured, Some(prev)) => {
                let measured = now.saturating_duration_since(prev).as_secs_f32() * 1000.0;
                measured.clamp(0.0, self.nominal_ms * self.max_time_scale)
            }
            _ => self.nominal_ms,
        };
        self.last = Some(now);
        self.elapsed += Duration::from_secs_f32(dt_ms / 1000.0);
        TickTime {
            dt_ms,
            time_scale: dt_ms / self.nominal_ms,
        }
    }

    /// Simulated time since the clock started.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[inline]
    pub fn nominal(&self) -> TickTime {
        TickTime::nominal(self.nominal_ms)
    }
}
