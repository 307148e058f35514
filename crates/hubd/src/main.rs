use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use hubd::Config;
use hubd::Engine;
use tracing_subscriber::prelude::*;

/// Home hub daemon serving ecobee thermostats and web links
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(default_value = "hubd.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(config.logging.targets())
        .init();

    tracing::info!("hubd starting");
    tracing::info!("Loaded config from: {}", args.config.display());

    let engine = Arc::new(Engine::new());
    engine.register_integrations_from_config(&config);

    let engine_task = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run().await })
    };

    let api = config.api.clone().map(|api| {
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let engine = engine.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = hubd::api::serve(api.listen, api.port, engine, shutdown_rx).await {
                tracing::error!("HTTP API server failed: {}", e);
            }
        });
        (shutdown_tx, handle)
    });

    tracing::info!("Press Ctrl+C to exit");

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received shutdown signal"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }

    if let Some((shutdown_tx, handle)) = api {
        let _ = shutdown_tx.send(());
        if let Err(e) = handle.await {
            tracing::error!("HTTP API task ended abnormally: {}", e);
        }
    }

    engine.shutdown().await;
    engine_task.abort();

    tracing::info!("hubd shutdown complete");

    Ok(())
}
