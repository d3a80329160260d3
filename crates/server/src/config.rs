//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default = "default_maps")]
    pub maps: Vec<MapConfig>,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            simulation: SimulationConfig::default(),
            player: PlayerConfig::default(),
            maps: default_maps(),
        }
    }
}

/// General server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server name shown in logs.
    #[serde(default = "default_name")]
    pub name: String,
    /// Tick interval in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Number of bot players to spawn.
    #[serde(default)]
    pub bots: usize,
    /// Snapshot channel capacity (ticks buffered per subscriber).
    #[serde(default = "default_snapshot_capacity")]
    pub snapshot_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            tick_interval_ms: default_tick_interval(),
            bots: 0,
            snapshot_capacity: default_snapshot_capacity(),
        }
    }
}

fn default_name() -> String {
    "Native Evade".to_string()
}
fn default_tick_interval() -> u64 {
    16
}
fn default_snapshot_capacity() -> usize {
    8
}

/// How the per-tick time step is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeScaleMode {
    /// Every tick advances exactly one nominal tick.
    #[default]
    Fixed,
    /// Each tick advances by the measured wall-clock delta.
    Measured,
}

/// Simulation timing and lifecycle settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Duration of one nominal tick in milliseconds. Velocities are per
    /// nominal tick.
    #[serde(default = "default_nominal_tick_ms")]
    pub nominal_tick_ms: f32,
    #[serde(default)]
    pub time_scale: TimeScaleMode,
    /// Upper clamp on the measured time scale.
    #[serde(default = "default_max_time_scale")]
    pub max_time_scale: f32,
    /// Seconds without players before a map is unloaded.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    /// Ticks between idle sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_ticks: u64,
    /// Extra radius added to broad-phase collision queries.
    #[serde(default = "default_collision_margin")]
    pub collision_margin: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            nominal_tick_ms: default_nominal_tick_ms(),
            time_scale: TimeScaleMode::Fixed,
            max_time_scale: default_max_time_scale(),
            idle_timeout_secs: default_idle_timeout(),
            sweep_interval_ticks: default_sweep_interval(),
            collision_margin: default_collision_margin(),
        }
    }
}

fn default_nominal_tick_ms() -> f32 {
    1000.0 / 60.0
}
fn default_max_time_scale() -> f32 {
    3.0
}
fn default_idle_timeout() -> u64 {
    60
}
fn default_sweep_interval() -> u64 {
    300
}
fn default_collision_margin() -> f32 {
    50.0
}

/// Player configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_radius")]
    pub radius: f32,
    /// Movement speed in pixels per nominal tick.
    #[serde(default = "default_player_speed")]
    pub speed: f32,
    /// Ticks after a teleport before another one can trigger.
    #[serde(default = "default_teleport_cooldown")]
    pub teleport_cooldown_ticks: u32,
    /// Map new players join.
    #[serde(default = "default_spawn_map")]
    pub spawn_map: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            radius: default_player_radius(),
            speed: default_player_speed(),
            teleport_cooldown_ticks: default_teleport_cooldown(),
            spawn_map: default_spawn_map(),
        }
    }
}

fn default_player_radius() -> f32 {
    25.0
}
fn default_player_speed() -> f32 {
    5.0
}
fn default_teleport_cooldown() -> u32 {
    30
}
fn default_spawn_map() -> String {
    "hub".to_string()
}

/// One map: tile rows, teleporters and spawn groups.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MapConfig {
    pub id: String,
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    /// Grid cell size; defaults to the tile size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_size: Option<f32>,
    /// Rows of tile codes: 0 wall, 1 floor, 2 spawnable safe zone,
    /// 3 teleporter, 4 safe zone.
    pub tiles: Vec<String>,
    #[serde(default)]
    pub teleporters: Vec<TeleporterConfig>,
    #[serde(default)]
    pub enemies: Vec<EnemySpawnConfig>,
}

fn default_tile_size() -> f32 {
    64.0
}

/// A teleporter tile and where it leads.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TeleporterConfig {
    pub x: usize,
    pub y: usize,
    pub code: String,
    pub destination: String,
}

/// A group of identical enemies placed when the map loads.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnemySpawnConfig {
    #[serde(flatten)]
    pub params: EnemyParams,
    #[serde(default = "default_enemy_count")]
    pub count: usize,
    #[serde(default = "default_enemy_radius")]
    pub radius: f32,
    #[serde(default = "default_enemy_min_speed")]
    pub min_speed: f32,
    #[serde(default = "default_enemy_max_speed")]
    pub max_speed: f32,
}

fn default_enemy_count() -> usize {
    1
}
fn default_enemy_radius() -> f32 {
    15.0
}
fn default_enemy_min_speed() -> f32 {
    2.0
}
fn default_enemy_max_speed() -> f32 {
    4.0
}

/// Variant-specific enemy parameters, tagged by `kind`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnemyParams {
    Basic,
    Sniper(SniperParams),
    Dasher(DasherParams),
    Homing(HomingParams),
    VoidCrawler(VoidCrawlerParams),
    Wall(WallParams),
    RecursiveBulletBoss(BossParams),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SniperParams {
    pub detection_radius: f32,
    pub shooting_radius: f32,
    pub cooldown_ticks: u32,
    pub bullet_radius: f32,
    pub bullet_speed: f32,
}

impl Default for SniperParams {
    fn default() -> Self {
        Self {
            detection_radius: 600.0,
            shooting_radius: 400.0,
            cooldown_ticks: 90,
            bullet_radius: 8.0,
            bullet_speed: 8.0,
        }
    }
}

/// Durations are in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DasherParams {
    pub time_to_idle: f32,
    pub time_to_prepare: f32,
    pub time_to_dash: f32,
    pub prepare_speed: f32,
    pub dash_speed: f32,
}

impl Default for DasherParams {
    fn default() -> Self {
        Self {
            time_to_idle: 1000.0,
            time_to_prepare: 750.0,
            time_to_dash: 3000.0,
            prepare_speed: 1.5,
            dash_speed: 12.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HomingParams {
    pub home_range: f32,
    /// Radians per nominal tick.
    pub turn_rate: f32,
}

impl Default for HomingParams {
    fn default() -> Self {
        Self {
            home_range: 500.0,
            turn_rate: 0.05,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VoidCrawlerParams {
    pub time_to_idle: f32,
    pub time_to_prepare: f32,
    pub time_to_lurch: f32,
    pub prepare_speed: f32,
    pub lurch_speed: f32,
    pub home_range: f32,
    pub turn_rate: f32,
}

impl Default for VoidCrawlerParams {
    fn default() -> Self {
        Self {
            time_to_idle: 1200.0,
            time_to_prepare: 600.0,
            time_to_lurch: 900.0,
            prepare_speed: 1.0,
            lurch_speed: 16.0,
            home_range: 700.0,
            turn_rate: 0.04,
        }
    }
}

/// Side of a patrol boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Top,
    Right,
    Bottom,
    Left,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WallParams {
    pub clockwise: bool,
    pub start_side: Side,
    /// Index of the floor region to patrol; the largest region if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<usize>,
}

impl Default for WallParams {
    fn default() -> Self {
        Self {
            clockwise: true,
            start_side: Side::Top,
            region: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BossParams {
    pub bullet_count: u32,
    pub cooldown_ticks: u32,
    /// Radians per nominal tick.
    pub rotation_speed: f32,
    pub bullet_radius: f32,
    pub bullet_speed: f32,
    pub recursion_level: u8,
    /// Ticks.
    pub lifespan: u32,
    /// Ticks.
    pub fire_delay: u32,
}

impl Default for BossParams {
    fn default() -> Self {
        Self {
            bullet_count: 6,
            cooldown_ticks: 120,
            rotation_speed: 0.03,
            bullet_radius: 12.0,
            bullet_speed: 4.0,
            recursion_level: 2,
            lifespan: 100,
            fire_delay: 15,
        }
    }
}

fn rows(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

fn spawn(params: EnemyParams, count: usize, radius: f32, min_speed: f32, max_speed: f32) -> EnemySpawnConfig {
    EnemySpawnConfig {
        params,
        count,
        radius,
        min_speed,
        max_speed,
    }
}

/// Two-map demo world linked by teleporter "A".
fn default_maps() -> Vec<MapConfig> {
    let hub = MapConfig {
        id: "hub".to_string(),
        tile_size: default_tile_size(),
        cell_size: None,
        tiles: rows(&[
            "00000000000000000000",
            "02222111111111111110",
            "02222111111111111110",
            "02222111111111111110",
            "02222111111111111130",
            "02222111111111111130",
            "02222111111111111110",
            "02222111111111111110",
            "02222111111111111110",
            "00000000000000000000",
        ]),
        teleporters: vec![
            TeleporterConfig { x: 18, y: 4, code: "A".into(), destination: "arena".into() },
            TeleporterConfig { x: 18, y: 5, code: "A".into(), destination: "arena".into() },
        ],
        enemies: vec![spawn(EnemyParams::Basic, 8, 15.0, 2.0, 4.0)],
    };

    let arena = MapConfig {
        id: "arena".to_string(),
        tile_size: default_tile_size(),
        cell_size: None,
        tiles: rows(&[
            "000000000000000000000000000000",
            "044111111111111111111111111110",
            "044111111111111111111111111110",
            "044111111111111111111111111110",
            "044111111100111111001111111110",
            "044111111100111111001111111110",
            "044111111111111111111111111110",
            "034111111111111111111111111110",
            "034111111111111111111111111110",
            "044111111111111111111111111110",
            "044111111100111111001111111110",
            "044111111100111111001111111110",
            "044111111111111111111111111110",
            "044111111111111111111111111110",
            "044111111111111111111111111110",
            "000000000000000000000000000000",
        ]),
        teleporters: vec![
            TeleporterConfig { x: 1, y: 7, code: "A".into(), destination: "hub".into() },
            TeleporterConfig { x: 1, y: 8, code: "A".into(), destination: "hub".into() },
        ],
        enemies: vec![
            spawn(EnemyParams::Basic, 6, 15.0, 2.0, 4.0),
            spawn(EnemyParams::Sniper(SniperParams::default()), 2, 18.0, 1.0, 2.0),
            spawn(EnemyParams::Dasher(DasherParams::default()), 3, 16.0, 3.0, 3.0),
            spawn(EnemyParams::Homing(HomingParams::default()), 3, 14.0, 2.5, 3.0),
            spawn(EnemyParams::VoidCrawler(VoidCrawlerParams::default()), 2, 18.0, 2.0, 2.0),
            spawn(EnemyParams::Wall(WallParams::default()), 4, 20.0, 3.0, 3.0),
            spawn(EnemyParams::RecursiveBulletBoss(BossParams::default()), 1, 40.0, 0.5, 0.5),
        ],
    };

    vec![hub, arena]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_survives_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.maps.len(), 2);
        assert_eq!(parsed.maps[1].enemies.len(), 7);
        assert!(matches!(parsed.maps[1].enemies[5].params, EnemyParams::Wall(_)));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [server]
            bots = 3

            [simulation]
            time_scale = "measured"

            [[maps]]
            id = "solo"
            tiles = ["222", "111"]

            [[maps.enemies]]
            kind = "dasher"
            count = 2
            time_to_prepare = 500.0
            "#,
        )
        .unwrap();

        assert_eq!(parsed.server.bots, 3);
        assert_eq!(parsed.server.tick_interval_ms, 16);
        assert_eq!(parsed.simulation.time_scale, TimeScaleMode::Measured);
        assert_eq!(parsed.maps[0].tile_size, 64.0);
        let group = &parsed.maps[0].enemies[0];
        assert_eq!(group.count, 2);
        assert_eq!(group.radius, 15.0);
        match &group.params {
            EnemyParams::Dasher(p) => {
                assert_eq!(p.time_to_prepare, 500.0);
                assert_eq!(p.time_to_dash, 3000.0);
            }
            other => panic!("unexpected params {other:?}"),
        }
    }
}
