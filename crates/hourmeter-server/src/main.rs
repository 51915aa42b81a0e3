//! # hourmeter-server
//!
//! Drives the hourmeter engine from a 1 Hz clock and exposes its signals
//! over HTTP.
//!
//! ## Running
//!
//! ```bash
//! # Development
//! cargo run --package hourmeter-server
//!
//! # Alternate config file
//! HOURMETER_CONFIG=./hourmeter.toml ./hourmeter-server
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use std::time::Duration;

use hourmeter_core::{config_path, HourmeterConfig, JsonFileStore};
use hourmeter_server::state::{flush, AppState};
use hourmeter_server::{api, logging, ticker};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = HourmeterConfig::load()?;

    let _log_guards = logging::init(&config.logging)?;

    info!(config = %config_path().display(), "Starting hourmeter-server");

    let addr = config.bind_address()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    let tick_period = Duration::from_millis(config.engine.tick_interval_ms);
    let store = JsonFileStore::new(&config.storage.state_file);
    info!(state_file = %store.path().display(), "Opening state store");

    let state = AppState::new(config, Box::new(store)).into_shared();
    let tick_handle = ticker::spawn(state.clone(), tick_period);

    let app = api::create_router(state.clone());

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    tick_handle.abort();
    flush(&state).await;

    served?;
    info!("hourmeter-server stopped");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
