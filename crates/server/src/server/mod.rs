//! Simulation server.

use crate::config::Config;
use bytes::Bytes;
use protocol::MapSnapshot;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

pub mod game;

pub use game::{GameState, SimStats, run_game_loop};

/// Ticks between snapshot size reports.
const SINK_REPORT_INTERVAL: u64 = 600;

/// Every loaded map's state after one tick.
#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    pub tick: u64,
    /// One entry per loaded map, ordered by map id.
    pub maps: Vec<MapSnapshot>,
}

impl WorldSnapshot {
    /// Binary frames, one per map.
    pub fn encode(&self) -> Vec<Bytes> {
        self.maps.iter().map(MapSnapshot::encode).collect()
    }
}

/// Run the simulation until Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    info!("Starting {}", config.server.name);

    let (snapshot_tx, _snapshot_rx) =
        broadcast::channel::<WorldSnapshot>(config.server.snapshot_capacity.max(1));

    let game_state = Arc::new(RwLock::new(GameState::new(config.clone())?));

    // Spawn the snapshot sink before the loop so the first tick is seen.
    let sink_rx = snapshot_tx.subscribe();
    tokio::spawn(async move {
        run_snapshot_sink(sink_rx).await;
    });

    let game_loop_state = Arc::clone(&game_state);
    let tick_interval = config.server.tick_interval_ms;
    let loop_tx = snapshot_tx.clone();
    tokio::spawn(async move {
        game::run_game_loop(game_loop_state, tick_interval, loop_tx).await;
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    let game = game_state.read().await;
    let stats = game.stats();
    info!(
        "Final state after {} ticks: {} maps, {} players, {} enemies, {} bullets (avg tick {:.3}ms)",
        game.tick_count,
        stats.maps,
        stats.players,
        stats.enemies,
        stats.bullets,
        game.update_time_avg
    );
    Ok(())
}

/// Encode every snapshot and periodically log the frame sizes. Stands in for
/// a network layer.
async fn run_snapshot_sink(mut rx: broadcast::Receiver<WorldSnapshot>) {
    loop {
        match rx.recv().await {
            Ok(snapshot) => {
                let frames = snapshot.encode();
                if snapshot.tick % SINK_REPORT_INTERVAL == 0 {
                    let total: usize = frames.iter().map(Bytes::len).sum();
                    debug!(
                        "Tick {}: {} map frames, {} bytes",
                        snapshot.tick,
                        frames.len(),
                        total
                    );
                }
            }
            Err(RecvError::Lagged(n)) => {
                warn!("Snapshot sink lagged by {} ticks", n);
            }
            Err(RecvError::Closed) => break,
        }
    }
}
