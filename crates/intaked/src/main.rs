//! intaked - Order Intake Server Daemon
//!
//! Accepts orders with a proof-of-payment upload, serves the stored
//! uploads and a placeholder QRIS image.
//!
//! Usage:
//!   intaked [OPTIONS] [config.toml]
//!
//! If no config file is provided, defaults are used: port 3000,
//! `./uploads` for stored files, `./placeholder-qris.png` for the QRIS image.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use intake_api::{create_router, AppState};
use intake_core::{IntakeConfig, LogRecorder};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "intaked")]
#[command(about = "Order intake server with payment proof uploads")]
struct Args {
    /// Configuration file path (TOML format)
    #[arg(value_name = "CONFIG")]
    config: Option<String>,

    /// Listening port, overrides `server.port` from the config file
    #[arg(short, long)]
    port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "intaked=info,intake_api=info,intake_core=info,tower_http=info".into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if args.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting intaked (Order Intake Server)");

    let config = load_config(&args)?;
    prepare_storage(&config).await?;

    let state = AppState::from_config(&config, Arc::new(LogRecorder));
    let app = create_router(state);

    let addr = config.listen_addr();
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Load, override and validate the configuration once at boot
fn load_config(args: &Args) -> anyhow::Result<IntakeConfig> {
    let mut config = match args.config {
        Some(ref path) => {
            tracing::info!("Loading config from: {}", path);
            IntakeConfig::load(path)?
        }
        None => {
            tracing::info!("No config file provided, using defaults");
            IntakeConfig::default()
        }
    };

    if let Some(port) = args.port {
        config.server.port = port;
    }

    config.validate()?;
    Ok(config)
}

/// Create the upload directory and check the placeholder asset
async fn prepare_storage(config: &IntakeConfig) -> anyhow::Result<()> {
    let storage = &config.storage;

    tokio::fs::create_dir_all(&storage.upload_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create upload directory {}",
                storage.upload_dir.display()
            )
        })?;

    tracing::info!(
        upload_dir = %storage.upload_dir.display(),
        max_upload_bytes = storage.max_upload_bytes,
        "Upload storage ready"
    );

    if !tokio::fs::try_exists(&storage.placeholder_qris)
        .await
        .unwrap_or(false)
    {
        tracing::warn!(
            path = %storage.placeholder_qris.display(),
            "QRIS placeholder image not found; /api/qrisdinamis will return 404 until it is provisioned"
        );
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
