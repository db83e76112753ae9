mod bootstrap;
mod health;
mod recommendations;

use std::time::Duration;

use anyhow::Result;
use axum::Router;
use kurbanlink_core::config::{AppConfig, LoadOptions};

use crate::recommendations::RecommendationState;

fn init_logging(config: &AppConfig) {
    use kurbanlink_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    // Bootstrap using the same config we already loaded
    let app = bootstrap::bootstrap_with_config(config).await?;

    let state = RecommendationState::new(app.db_pool.clone(), &app.config.recommendation);
    let router = Router::new()
        .merge(health::router(app.db_pool.clone()))
        .merge(recommendations::router(state));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "kurbanlink-server started"
    );

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "kurbanlink-server stopping"
    );

    let drain = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let _ = tokio::time::timeout(drain, app.db_pool.close()).await;

    Ok(())
}

async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
