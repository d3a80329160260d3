//! Evade - headless simulation server.

use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Evade - Simulation Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = server::Config::load()?;
    info!("Loaded configuration");
    info!("  Tick interval: {}ms", config.server.tick_interval_ms);
    info!("  Time scale: {:?}", config.simulation.time_scale);
    info!("  Maps: {}", config.maps.len());
    info!("  Bots: {}", config.server.bots);

    server::run(config).await?;

    Ok(())
}
