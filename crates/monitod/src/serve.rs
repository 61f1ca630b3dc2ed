//! Serve mode: the status API over an in-memory store.
//!
//! 1. Opens the store, seeded with the demo catalog unless told otherwise
//! 2. Wires the simulator, event log and latency into the API state
//! 3. Serves until Ctrl-C, then drains in-flight requests

use std::net::SocketAddr;

use axum::Router;
use tracing::{error, info};

use monito_api::{ApiState, build_router};
use monito_state::StateStore;

use crate::config::ServeConfig;

/// Assemble the router for `config`.
pub fn build_app(config: &ServeConfig) -> anyhow::Result<Router> {
    let store = if config.seed {
        StateStore::open_seeded()?
    } else {
        StateStore::open_in_memory()?
    };
    info!(services = store.len()?, seeded = config.seed, "state store opened");

    let state = ApiState::new(store).with_latency(config.latency);
    Ok(build_router(state))
}

pub async fn run_serve(config: ServeConfig) -> anyhow::Result<()> {
    info!("monitod starting in serve mode");

    let router = build_app(&config)?;
    if config.latency.is_disabled() {
        info!("synthetic latency disabled");
    } else {
        info!(
            min_ms = config.latency.min().as_millis() as u64,
            max_ms = config.latency.max().as_millis() as u64,
            "synthetic latency enabled"
        );
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("monitod stopped");
    Ok(())
}
