//! Simulation state and main loop.

use super::WorldSnapshot;
use crate::ai::{BOT_NAMES, BotManager};
use crate::clock::{TickClock, TickTime};
use crate::config::Config;
use crate::entity::enemy::PlayerView;
use crate::entity::{EntityId, IdAllocator, Player};
use crate::error::{MapError, SimError};
use crate::map::{MapRegistry, TeleportTarget, TileType};
use crate::physics::{self, Blocking, Response};
use crate::runtime::MapRuntime;
use futures_util::FutureExt;
use glam::Vec2;
use protocol::{Color, MapSnapshot, PlayerRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

/// Ticks between timing summaries in the debug log.
const STATS_INTERVAL: u64 = 600;

/// Entity counts across every loaded map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimStats {
    pub maps: usize,
    pub players: usize,
    pub enemies: usize,
    pub bullets: usize,
}

/// Main simulation state.
pub struct GameState {
    pub config: Config,
    pub registry: MapRegistry,
    /// Loaded maps by id.
    pub runtimes: BTreeMap<String, MapRuntime>,
    pub players: BTreeMap<EntityId, Player>,
    pub bots: BotManager,
    pub tick_count: u64,

    // Average tick duration in milliseconds (exponential moving average).
    pub update_time_avg: f64,

    clock: TickClock,
    ids: IdAllocator,
    rng: StdRng,
}

impl GameState {
    /// Build the map registry from `config`. No map is loaded until a player
    /// needs it.
    pub fn new(config: Config) -> Result<Self, MapError> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Same as `new` with a deterministic random source.
    pub fn with_seed(config: Config, seed: u64) -> Result<Self, MapError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: Config, rng: StdRng) -> Result<Self, MapError> {
        let registry = MapRegistry::from_config(&config.maps)?;
        let broken = registry.validate_links();
        if broken > 0 {
            warn!("{} teleporter links are broken", broken);
        }
        if !registry.contains(&config.player.spawn_map) {
            warn!("Spawn map {} is not defined", config.player.spawn_map);
        }
        info!("Registered {} maps", registry.len());

        Ok(Self {
            clock: TickClock::new(&config.simulation),
            config,
            registry,
            runtimes: BTreeMap::new(),
            players: BTreeMap::new(),
            bots: BotManager::new(),
            tick_count: 0,
            update_time_avg: 0.0,
            ids: IdAllocator::default(),
            rng,
        })
    }

    /// The runtime for `map_id`, loading it first if needed. Marks it as
    /// accessed.
    pub fn load_map_if_needed(&mut self, map_id: &str) -> Result<&mut MapRuntime, SimError> {
        let now = self.clock.elapsed();
        ensure_runtime(
            &mut self.runtimes,
            &self.registry,
            &mut self.ids,
            &mut self.rng,
            now,
            map_id,
        )
    }

    /// Unload every map nobody is on that has not been accessed within the
    /// idle timeout. Returns the number of maps unloaded.
    pub fn sweep_idle_maps(&mut self) -> usize {
        let now = self.clock.elapsed();
        let timeout = Duration::from_secs(self.config.simulation.idle_timeout_secs);
        let players = &self.players;
        let idle: Vec<String> = self
            .runtimes
            .iter()
            .filter(|(id, rt)| {
                rt.is_idle(now, timeout)
                    && !players.values().any(|p| p.current_map_id.as_str() == id.as_str())
            })
            .map(|(id, _)| id.clone())
            .collect();

        for id in &idle {
            if let Some(mut runtime) = self.runtimes.remove(id) {
                runtime.teardown();
                info!("Unloaded idle map {}", id);
            }
        }
        idle.len()
    }

    /// Spawn a player on the configured spawn map, preferring spawnable safe
    /// zone tiles over plain floor.
    pub fn add_player(&mut self, name: impl Into<String>) -> Result<EntityId, SimError> {
        let map_id = self.config.player.spawn_map.clone();
        let radius = self.config.player.radius;
        let speed = self.config.player.speed;
        let now = self.clock.elapsed();

        let runtime = ensure_runtime(
            &mut self.runtimes,
            &self.registry,
            &mut self.ids,
            &mut self.rng,
            now,
            &map_id,
        )?;
        let position = [TileType::SafeSpawn, TileType::Floor]
            .into_iter()
            .find_map(|tile| {
                runtime
                    .map
                    .get_valid_spawn_position(tile, radius, &runtime.grid, &mut self.rng)
            })
            .ok_or_else(|| SimError::NoSpawnPosition(map_id.clone()))?;

        let id = self.ids.next_id();
        let color = random_color(&mut self.rng);
        let player = Player::new(id, name.into(), map_id, position, radius, speed, color);
        runtime.grid.insert(&player.body);
        info!("Player {} ({}) joined map {}", player.name, id, player.current_map_id);
        self.players.insert(id, player);
        Ok(id)
    }

    pub fn remove_player(&mut self, id: EntityId) -> Result<Player, SimError> {
        let player = self.players.remove(&id).ok_or(SimError::UnknownPlayer(id))?;
        if let Some(runtime) = self.runtimes.get_mut(&player.current_map_id) {
            runtime.grid.remove(id);
        }
        self.bots.remove_bot(id);
        info!("Player {} ({}) left", player.name, id);
        Ok(player)
    }

    pub fn set_input(&mut self, id: EntityId, direction: Vec2) -> Result<(), SimError> {
        self.players
            .get_mut(&id)
            .ok_or(SimError::UnknownPlayer(id))?
            .set_input(direction);
        Ok(())
    }

    /// Spawn the configured number of bot players.
    pub fn spawn_bots(&mut self) {
        let count = self.config.server.bots;
        if count == 0 {
            return;
        }
        info!("Spawning {} bots", count);
        for i in 0..count {
            let name = BOT_NAMES[i % BOT_NAMES.len()];
            match self.add_player(name) {
                Ok(id) => {
                    if let Some(player) = self.players.get_mut(&id) {
                        player.is_bot = true;
                    }
                    self.bots.add_bot(id);
                }
                Err(e) => {
                    warn!("Failed to spawn bot: {}", e);
                    break;
                }
            }
        }
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) -> WorldSnapshot {
        let tick_start = std::time::Instant::now();
        self.tick_count += 1;
        let time = self.clock.advance();
        let now = self.clock.elapsed();

        let sweep_start = std::time::Instant::now();
        if self.tick_count % self.config.simulation.sweep_interval_ticks.max(1) == 0 {
            self.sweep_idle_maps();
        }
        let sweep_time = sweep_start.elapsed();

        let ai_start = std::time::Instant::now();
        self.bots.update(&mut self.players, &self.runtimes, &mut self.rng);
        let ai_time = ai_start.elapsed();

        let move_start = std::time::Instant::now();
        let transitions = self.move_players(time, now);
        self.apply_teleports(transitions, now);
        let move_time = move_start.elapsed();

        let map_start = std::time::Instant::now();
        self.update_maps(time);
        let map_time = map_start.elapsed();

        let collision_start = std::time::Instant::now();
        self.resolve_collisions();
        let collision_time = collision_start.elapsed();

        let snapshot = self.snapshot();

        if self.tick_count % STATS_INTERVAL == 0 {
            let stats = self.stats();
            debug!(
                "Tick {} timing: sweep={:?} ai={:?} move={:?} maps={:?} collisions={:?} total={:?} | {} maps, {} players, {} enemies, {} bullets",
                self.tick_count,
                sweep_time,
                ai_time,
                move_time,
                map_time,
                collision_time,
                tick_start.elapsed(),
                stats.maps,
                stats.players,
                stats.enemies,
                stats.bullets
            );
        }

        snapshot
    }

    /// Move every player and collect the teleports they triggered.
    fn move_players(&mut self, time: TickTime, now: Duration) -> Vec<(EntityId, TeleportTarget)> {
        let mut transitions = Vec::new();

        for player in self.players.values_mut() {
            let Some(runtime) = self.runtimes.get_mut(&player.current_map_id) else {
                warn!("Player {} is on unloaded map {}", player.id(), player.current_map_id);
                continue;
            };
            runtime.touch(now);

            player.teleport_cooldown = player.teleport_cooldown.saturating_sub(1);
            player.body.begin_step();
            player.apply_input();
            if !player.is_dead {
                physics::resolve_motion(
                    &mut player.body,
                    &mut runtime.grid,
                    time.time_scale,
                    Response::Slide,
                    Blocking::PLAYER,
                    &mut self.rng,
                );
            }

            let pos = player.body.position;
            let radius = player.body.radius;
            if runtime.grid.is_fully_outside_teleporter(pos, radius) {
                player.can_teleport = true;
            }
            if !player.can_teleport || player.teleport_cooldown > 0 || player.is_dead {
                continue;
            }
            let Some(teleporter) = runtime.grid.teleporter_containing(pos, radius) else {
                continue;
            };
            match self.registry.resolve_link(&teleporter.destination, &teleporter.code) {
                Some(target) => transitions.push((player.id(), target)),
                None => debug!(
                    "Teleporter {} on map {} leads to missing map {}",
                    teleporter.code, player.current_map_id, teleporter.destination
                ),
            }
        }

        transitions
    }

    fn apply_teleports(&mut self, transitions: Vec<(EntityId, TeleportTarget)>, now: Duration) {
        for (id, target) in transitions {
            let Some(player) = self.players.get_mut(&id) else {
                continue;
            };
            if let Err(e) = ensure_runtime(
                &mut self.runtimes,
                &self.registry,
                &mut self.ids,
                &mut self.rng,
                now,
                &target.map_id,
            ) {
                warn!("Teleport of player {} failed: {}", id, e);
                continue;
            }

            if let Some(old) = self.runtimes.get_mut(&player.current_map_id) {
                old.grid.remove(id);
            }
            let from = std::mem::replace(&mut player.current_map_id, target.map_id.clone());
            player.body.position = target.position;
            player.body.prev_position = target.position;
            player.can_teleport = false;
            player.teleport_cooldown = self.config.player.teleport_cooldown_ticks;
            if let Some(dest) = self.runtimes.get_mut(&target.map_id) {
                dest.grid.insert(&player.body);
            }
            info!("Player {} teleported from {} to {}", id, from, target.map_id);
        }
    }

    /// Run enemies and projectiles on every loaded map.
    fn update_maps(&mut self, time: TickTime) {
        let mut views: BTreeMap<&str, Vec<PlayerView>> = BTreeMap::new();
        for player in self.players.values().filter(|p| !p.is_dead) {
            let Some(runtime) = self.runtimes.get(&player.current_map_id) else {
                continue;
            };
            let pos = player.body.position;
            views
                .entry(player.current_map_id.as_str())
                .or_default()
                .push(PlayerView {
                    id: player.id(),
                    position: pos,
                    radius: player.body.radius,
                    protected: runtime.grid.check_safe_zone_collision(pos, 1.0)
                        || runtime.grid.check_teleporter_collision(pos, 1.0),
                });
        }

        for (map_id, runtime) in &mut self.runtimes {
            let players = views.get(map_id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
            runtime.update_enemies(time, players, &mut self.ids, &mut self.rng);
            runtime.update_bullets(time.time_scale, &mut self.ids);
        }
    }

    /// Kill players touching an enemy or projectile, then revive dead
    /// players a living teammate is touching.
    fn resolve_collisions(&mut self) {
        let margin = self.config.simulation.collision_margin;

        for player in self.players.values_mut().filter(|p| !p.is_dead) {
            let Some(runtime) = self.runtimes.get_mut(&player.current_map_id) else {
                continue;
            };
            if let Some(hit) = runtime.collide_player(player.body.position, player.body.radius, margin) {
                player.kill();
                debug!("Player {} hit by {} on map {}", player.id(), hit, player.current_map_id);
            }
        }
        for runtime in self.runtimes.values_mut() {
            runtime.drop_inactive_bullets();
        }

        let mut revived = Vec::new();
        for player in self.players.values().filter(|p| p.is_dead) {
            let Some(runtime) = self.runtimes.get(&player.current_map_id) else {
                continue;
            };
            let pos = player.body.position;
            let radius = player.body.radius;
            let rescued = runtime
                .grid
                .query_area(pos.x, pos.y, radius + margin)
                .into_iter()
                .filter(|&id| id != player.id())
                .filter_map(|id| self.players.get(&id))
                .any(|other| {
                    !other.is_dead
                        && other.current_map_id == player.current_map_id
                        && physics::check_circle_collision(pos, radius, other.body.position, other.body.radius)
                            .is_colliding()
                });
            if rescued {
                revived.push(player.id());
            }
        }
        for id in revived {
            if let Some(player) = self.players.get_mut(&id) {
                player.revive();
                debug!("Player {} revived on map {}", id, player.current_map_id);
            }
        }
    }

    /// One snapshot per loaded map, ordered by map id.
    pub fn snapshot(&self) -> WorldSnapshot {
        let maps: Vec<MapSnapshot> = self
            .runtimes
            .iter()
            .map(|(id, runtime)| {
                let players: Vec<PlayerRecord> = self
                    .players
                    .values()
                    .filter(|p| &p.current_map_id == id)
                    .map(Player::serialize)
                    .collect();
                runtime.snapshot(self.tick_count, players)
            })
            .collect();
        WorldSnapshot {
            tick: self.tick_count,
            maps,
        }
    }

    pub fn stats(&self) -> SimStats {
        SimStats {
            maps: self.runtimes.len(),
            players: self.players.len(),
            enemies: self.runtimes.values().map(|r| r.enemies.len()).sum(),
            bullets: self.runtimes.values().map(|r| r.bullets.len()).sum(),
        }
    }
}

fn ensure_runtime<'a>(
    runtimes: &'a mut BTreeMap<String, MapRuntime>,
    registry: &MapRegistry,
    ids: &mut IdAllocator,
    rng: &mut StdRng,
    now: Duration,
    map_id: &str,
) -> Result<&'a mut MapRuntime, SimError> {
    let runtime = match runtimes.entry(map_id.to_string()) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => {
            let def = registry
                .get(map_id)
                .ok_or_else(|| SimError::UnknownMap(map_id.to_string()))?;
            let runtime = MapRuntime::load(def, ids, rng, now);
            info!("Loaded map {} with {} enemies", map_id, runtime.enemies.len());
            entry.insert(runtime)
        }
    };
    runtime.touch(now);
    Ok(runtime)
}

fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Color {
    Color::new(
        rng.random_range(50..=255),
        rng.random_range(50..=255),
        rng.random_range(50..=255),
    )
}

/// Run the simulation loop.
pub async fn run_game_loop(
    state: Arc<RwLock<GameState>>,
    tick_interval_ms: u64,
    snapshot_tx: broadcast::Sender<WorldSnapshot>,
) {
    let start = Instant::now() + Duration::from_millis(tick_interval_ms);
    let mut ticker = interval_at(start, Duration::from_millis(tick_interval_ms));
    // Skip missed ticks so the loop never bursts to catch up.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    {
        let mut game = state.write().await;
        game.spawn_bots();
        info!(
            "Simulation ready: {} maps registered, {} players",
            game.registry.len(),
            game.players.len()
        );
    }

    loop {
        let scheduled = ticker.tick().await;

        // Drain any backlog so the next tick runs on current input.
        let mut skipped = 0u32;
        while ticker.tick().now_or_never().is_some() {
            skipped += 1;
        }
        if skipped > 0 {
            debug!(
                "Skipped {} ticks to stay current (lag: {:?})",
                skipped,
                Instant::now().saturating_duration_since(scheduled)
            );
        }

        let snapshot = {
            let mut game = state.write().await;
            let tick_start = std::time::Instant::now();
            let snapshot = game.tick();
            let tick_ms = tick_start.elapsed().as_secs_f64() * 1000.0;

            game.update_time_avg = game.update_time_avg * 0.5 + tick_ms * 0.5;

            let tick_budget = tick_interval_ms as f64 * 0.9;
            if tick_ms > tick_budget {
                let stats = game.stats();
                warn!(
                    "Slow tick #{}: {:.3}ms (budget: {:.1}ms) - {} maps, {} players, {} enemies, {} bullets",
                    game.tick_count,
                    tick_ms,
                    tick_budget,
                    stats.maps,
                    stats.players,
                    stats.enemies,
                    stats.bullets
                );
            }

            snapshot
        }; // Write lock released here

        if snapshot_tx.receiver_count() > 0 {
            let tx = snapshot_tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(snapshot);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MapConfig, PlayerConfig, ServerConfig, SimulationConfig, TeleporterConfig};
    use crate::entity::Enemy;
    use crate::entity::enemy::{Basic, EnemyBehavior};
    use crate::map::tests::rows;

    fn linked_maps() -> Config {
        let map = |id: &str, destination: &str| MapConfig {
            id: id.to_string(),
            tile_size: 64.0,
            cell_size: None,
            tiles: rows(&["0000000", "0211130", "0211110", "0000000"]),
            teleporters: vec![TeleporterConfig {
                x: 5,
                y: 1,
                code: "A".to_string(),
                destination: destination.to_string(),
            }],
            enemies: Vec::new(),
        };
        Config {
            server: ServerConfig::default(),
            simulation: SimulationConfig::default(),
            player: PlayerConfig {
                spawn_map: "a".to_string(),
                ..PlayerConfig::default()
            },
            maps: vec![map("a", "b"), map("b", "a")],
        }
    }

    fn place(game: &mut GameState, id: EntityId, pos: Vec2) {
        let player = game.players.get_mut(&id).unwrap();
        player.body.position = pos;
        player.body.prev_position = pos;
        game.runtimes
            .get_mut(&player.current_map_id)
            .unwrap()
            .grid
            .update(&player.body);
    }

    #[test]
    fn test_add_and_remove_player() {
        let mut game = GameState::with_seed(linked_maps(), 1).unwrap();
        assert!(game.runtimes.is_empty());

        let id = game.add_player("alice").unwrap();
        let player = &game.players[&id];
        assert_eq!(player.current_map_id, "a");
        assert!(!player.can_teleport);
        // Spawn tiles are the column x = 1.
        assert!(player.body.position.x > 64.0 && player.body.position.x < 128.0);
        assert!(game.runtimes["a"].grid.contains(id));
        assert!(!game.runtimes.contains_key("b"));

        game.remove_player(id).unwrap();
        assert!(!game.runtimes["a"].grid.contains(id));
        assert!(matches!(game.remove_player(id), Err(SimError::UnknownPlayer(_))));
        assert!(matches!(game.set_input(id, Vec2::X), Err(SimError::UnknownPlayer(_))));
    }

    #[test]
    fn test_unknown_spawn_map() {
        let mut config = linked_maps();
        config.player.spawn_map = "nowhere".to_string();
        let mut game = GameState::with_seed(config, 2).unwrap();
        assert!(matches!(game.add_player("bob"), Err(SimError::UnknownMap(_))));
        assert!(game.players.is_empty());
    }

    #[test]
    fn test_players_move_and_dead_players_stay() {
        let mut game = GameState::with_seed(linked_maps(), 3).unwrap();
        let id = game.add_player("p").unwrap();
        place(&mut game, id, Vec2::new(224.0, 160.0));

        game.set_input(id, Vec2::X).unwrap();
        game.tick();
        assert_eq!(game.players[&id].body.position, Vec2::new(229.0, 160.0));
        assert_eq!(game.players[&id].body.prev_position, Vec2::new(224.0, 160.0));

        game.players.get_mut(&id).unwrap().kill();
        game.tick();
        assert_eq!(game.players[&id].body.position, Vec2::new(229.0, 160.0));
        assert!(game.players[&id].is_dead);
    }

    #[test]
    fn test_teleport_round_trip() {
        let mut game = GameState::with_seed(linked_maps(), 4).unwrap();
        let id = game.add_player("p").unwrap();
        place(&mut game, id, Vec2::new(224.0, 96.0));
        game.tick();
        assert!(game.players[&id].can_teleport);

        // Center of the teleporter tile (5, 1).
        place(&mut game, id, Vec2::new(352.0, 96.0));
        let snapshot = game.tick();
        let player = &game.players[&id];
        assert_eq!(player.current_map_id, "b");
        assert_eq!(player.body.position, Vec2::new(352.0, 96.0));
        assert!(!player.can_teleport);
        assert_eq!(player.teleport_cooldown, 30);
        assert!(game.runtimes["b"].grid.contains(id));
        assert!(!game.runtimes["a"].grid.contains(id));
        assert!(
            snapshot
                .maps
                .iter()
                .any(|m| m.map_id == "b" && m.players.len() == 1)
        );

        // Standing on the arrival teleporter never sends the player back.
        for _ in 0..40 {
            game.tick();
        }
        assert_eq!(game.players[&id].current_map_id, "b");

        place(&mut game, id, Vec2::new(224.0, 96.0));
        game.tick();
        place(&mut game, id, Vec2::new(352.0, 96.0));
        game.tick();
        assert_eq!(game.players[&id].current_map_id, "a");
    }

    #[test]
    fn test_enemy_kills_and_teammate_revives() {
        let mut game = GameState::with_seed(linked_maps(), 5).unwrap();
        let victim = game.add_player("victim").unwrap();
        place(&mut game, victim, Vec2::new(224.0, 160.0));

        let enemy = Enemy::new(
            game.ids.next_id(),
            Vec2::new(259.0, 160.0),
            15.0,
            0.0,
            0.0,
            EnemyBehavior::Basic(Basic),
        );
        let runtime = game.runtimes.get_mut("a").unwrap();
        runtime.grid.insert(&enemy.body);
        runtime.enemies.insert(enemy.id(), enemy);

        game.tick();
        assert!(game.players[&victim].is_dead);

        let rescuer = game.add_player("rescuer").unwrap();
        place(&mut game, rescuer, Vec2::new(224.0, 115.0));
        game.tick();
        assert!(!game.players[&rescuer].is_dead);
        assert!(!game.players[&victim].is_dead);
    }

    #[test]
    fn test_player_on_unloaded_map_is_skipped() {
        let mut game = GameState::with_seed(linked_maps(), 8).unwrap();
        let id = game.add_player("p").unwrap();
        place(&mut game, id, Vec2::new(224.0, 160.0));
        game.players.get_mut(&id).unwrap().current_map_id = "nowhere".to_string();
        game.set_input(id, Vec2::X).unwrap();

        let snapshot = game.tick();
        let player = &game.players[&id];
        assert_eq!(player.current_map_id, "nowhere");
        assert_eq!(player.body.position, Vec2::new(224.0, 160.0));
        assert!(snapshot.maps.iter().all(|m| m.players.is_empty()));
    }

    #[test]
    fn test_teleporter_to_missing_map_is_ignored() {
        let mut config = linked_maps();
        config.maps[0].teleporters[0].destination = "nowhere".to_string();
        let mut game = GameState::with_seed(config, 9).unwrap();
        let id = game.add_player("p").unwrap();
        place(&mut game, id, Vec2::new(224.0, 96.0));
        game.tick();
        assert!(game.players[&id].can_teleport);

        place(&mut game, id, Vec2::new(352.0, 96.0));
        game.tick();
        let player = &game.players[&id];
        assert_eq!(player.current_map_id, "a");
        assert_eq!(player.body.position, Vec2::new(352.0, 96.0));
        assert!(player.can_teleport);
        assert!(!game.runtimes.contains_key("nowhere"));
    }

    #[test]
    fn test_failed_teleport_leaves_player_in_place() {
        let mut game = GameState::with_seed(linked_maps(), 10).unwrap();
        let id = game.add_player("p").unwrap();
        place(&mut game, id, Vec2::new(224.0, 160.0));

        let target = TeleportTarget {
            map_id: "nowhere".to_string(),
            position: Vec2::new(352.0, 96.0),
        };
        game.apply_teleports(vec![(id, target)], Duration::ZERO);
        let player = &game.players[&id];
        assert_eq!(player.current_map_id, "a");
        assert_eq!(player.body.position, Vec2::new(224.0, 160.0));
        assert_eq!(player.teleport_cooldown, 0);
        assert!(game.runtimes["a"].grid.contains(id));
        assert_eq!(game.runtimes.len(), 1);

        let snapshot = game.tick();
        assert_eq!(snapshot.maps.len(), 1);
        assert_eq!(snapshot.maps[0].players.len(), 1);
    }

    #[test]
    fn test_same_seed_runs_match() {
        let run = || {
            let mut game = GameState::with_seed(Config::default(), 42).unwrap();
            game.add_player("p").unwrap();
            game.load_map_if_needed("arena").unwrap();
            for _ in 0..600 {
                game.tick();
            }
            game.snapshot().encode()
        };
        let first = run();
        assert_eq!(first.len(), 2);
        assert_eq!(first, run());
    }

    #[test]
    fn test_idle_maps_are_unloaded() {
        let mut config = linked_maps();
        config.simulation.sweep_interval_ticks = 1;
        config.simulation.idle_timeout_secs = 0;
        let mut game = GameState::with_seed(config, 6).unwrap();

        let id = game.add_player("p").unwrap();
        game.tick();
        assert!(game.runtimes.contains_key("a"));

        game.remove_player(id).unwrap();
        game.tick();
        assert!(game.runtimes.is_empty());
        assert_eq!(game.snapshot().maps.len(), 0);
    }

    #[test]
    fn test_bots_spawn_and_tick() {
        let mut config = linked_maps();
        config.server.bots = 3;
        let mut game = GameState::with_seed(config, 7).unwrap();
        game.spawn_bots();
        assert_eq!(game.players.len(), 3);
        assert_eq!(game.bots.len(), 3);
        assert!(game.players.values().all(|p| p.is_bot));

        for _ in 0..120 {
            game.tick();
        }
        let stats = game.stats();
        assert_eq!(stats.players, 3);
        assert!(stats.maps >= 1);
    }
}
