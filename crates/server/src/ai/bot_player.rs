use crate::entity::{EntityId, Player};
use crate::runtime::MapRuntime;
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

/// Bot names to use.
pub const BOT_NAMES: &[&str] = &[
    "Bot", "Dodger", "Runner", "Ghost", "Shadow", "Swift", "Tiny", "Wisp",
    "Drifter", "Wanderer", "Skipper", "Nimble", "Flicker", "Blink", "Zip", "Dash",
];

/// Enemies closer than this make the bot flee.
const THREAT_RADIUS: f32 = 160.0;
/// Ticks between wander decisions.
const DECISION_INTERVAL: u32 = 90;
/// Chance per decision to head for a teleporter instead of wandering.
const TELEPORTER_CHANCE: f64 = 0.25;
/// Distance at which a goal counts as reached.
const GOAL_REACHED: f32 = 8.0;

/// A player driven by the server.
#[derive(Debug)]
pub struct Bot {
    /// Player id of the bot.
    pub id: EntityId,
    /// Wander heading in radians.
    pub heading: f32,
    /// Point the bot is walking to, if any.
    pub goal: Option<Vec2>,
    /// Ticks until next decision.
    pub decision_cooldown: u32,
}

impl Bot {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            heading: 0.0,
            goal: None,
            decision_cooldown: 0,
        }
    }

    /// Pick this tick's movement intent for `player` on `runtime`.
    pub fn update<R: Rng + ?Sized>(&mut self, player: &mut Player, runtime: &MapRuntime, rng: &mut R) {
        if player.is_dead {
            player.set_input(Vec2::ZERO);
            return;
        }
        let pos = player.body.position;

        if let Some(threat) = nearest_enemy(runtime, pos, THREAT_RADIUS + player.body.radius) {
            self.goal = None;
            player.set_input((pos - threat).normalize_or(Vec2::from_angle(self.heading)));
            return;
        }

        if self.decision_cooldown == 0 {
            self.decision_cooldown = DECISION_INTERVAL;
            self.heading = rng.random_range(0.0..TAU);
            self.goal = if rng.random_bool(TELEPORTER_CHANCE) {
                random_teleporter(runtime, rng)
            } else {
                None
            };
        } else {
            self.decision_cooldown -= 1;
        }

        let direction = match self.goal {
            Some(goal) if goal.distance(pos) > GOAL_REACHED => (goal - pos).normalize_or_zero(),
            Some(_) => {
                self.goal = None;
                Vec2::ZERO
            }
            None => Vec2::from_angle(self.heading),
        };
        player.set_input(direction);
    }
}

/// Position of the closest enemy within `range`.
fn nearest_enemy(runtime: &MapRuntime, pos: Vec2, range: f32) -> Option<Vec2> {
    runtime
        .grid
        .query_area(pos.x, pos.y, range)
        .into_iter()
        .filter_map(|id| runtime.enemies.get(&id))
        .map(|e| e.body.position)
        .filter(|p| p.distance(pos) <= range)
        .min_by(|a, b| a.distance_squared(pos).total_cmp(&b.distance_squared(pos)))
}

fn random_teleporter<R: Rng + ?Sized>(runtime: &MapRuntime, rng: &mut R) -> Option<Vec2> {
    let teleporters = runtime.map.teleporters();
    if teleporters.is_empty() {
        return None;
    }
    let idx = rng.random_range(0..teleporters.len());
    teleporters
        .iter()
        .nth(idx)
        .map(|t| runtime.map.tile_center(t.tile_x, t.tile_y))
}
