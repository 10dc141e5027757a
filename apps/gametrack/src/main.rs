//! GameTrack host entry point.

mod app;
mod config;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting GameTrack");

    let config = config::Config::load()?;
    tracing::info!(
        store = if config.store.project_id.is_empty() { "memory" } else { "firestore" },
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config))?;

    tracing::info!("GameTrack shut down cleanly");
    Ok(())
}
