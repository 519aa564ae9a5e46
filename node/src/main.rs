// node/src/main.rs

//! Time-release blockchain node binary.
//!
//! This binary exposes the node HTTP API on top of the `chain` crate:
//!
//! - `GET /` — greeting
//! - `GET /blocks`, `GET /last`, `GET /logs` — chain queries
//! - `POST /txion`, `GET /txion?update=` — transaction intake and drain
//!
//! It embeds a `DefaultChainEngine` (RocksDB-backed), the pending
//! transaction pool, the in-process Pollard-rho miner loop, and a
//! Prometheus metrics exporter on `/metrics`.

mod config;
mod miner;
mod routes;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};
use tokio::signal;

use chain::{Address, ChainConfig, MetricsRegistry, run_prometheus_http_server};
use config::NodeConfig;
use state::{AppState, PendingPool, SharedState};

#[tokio::main]
async fn main() {
    // Basic tracing setup.
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "node=info,chain=info".to_string()),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let node_cfg = NodeConfig::from_env();
    let chain_cfg = ChainConfig::from_env();

    // ---------------------------
    // Metrics
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new()
            .map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    if chain_cfg.metrics.enabled {
        let metrics_clone = metrics.clone();
        let addr = chain_cfg.metrics.listen_addr;
        tokio::spawn(async move {
            if let Err(e) = run_prometheus_http_server(metrics_clone, addr).await {
                tracing::warn!("metrics HTTP server error: {e}");
            }
        });
        tracing::info!("metrics exporter listening on http://{}/metrics", addr);
    }

    // ---------------------------
    // Storage + consensus engine
    // ---------------------------

    let engine = chain::default_engine(&chain_cfg).map_err(|e| {
        format!(
            "failed to open chain store at {}: {e}",
            chain_cfg.storage.path
        )
    })?;

    // ---------------------------
    // Shared state
    // ---------------------------

    let miner_address = Address::new(chain_cfg.miner.address.clone());
    let app_state: SharedState = Arc::new(AppState {
        engine: tokio::sync::Mutex::new(engine),
        pending: tokio::sync::Mutex::new(PendingPool::new()),
        miner_address,
        metrics: metrics.clone(),
    });

    // ---------------------------
    // Miner loop
    // ---------------------------

    if chain_cfg.miner.address.is_empty() {
        tracing::warn!("MINER_ADDRESS not set; this node serves the API but does not mine");
    } else {
        let miner_state = app_state.clone();
        let miner_cfg = chain_cfg.clone();
        tokio::spawn(async move {
            miner::run_miner_loop(miner_state, miner_cfg).await;
        });
    }

    // ---------------------------
    // HTTP router
    // ---------------------------

    let app = Router::new()
        .route("/", get(routes::index))
        .route("/blocks", get(routes::blocks::blocks))
        .route("/last", get(routes::blocks::last))
        .route("/logs", get(routes::logs::logs))
        .route(
            "/txion",
            get(routes::txion::pending).post(routes::txion::submit),
        )
        .with_state(app_state);

    // ---------------------------
    // axum 0.8 server (hyper 1 style)
    // ---------------------------

    tracing::info!("node listening on http://{}", node_cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(node_cfg.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", node_cfg.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("node server error: {e}"))?;

    Ok(())
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
