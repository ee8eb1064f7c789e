//! Statecast server binary.
//!
//! Wires together the coordinator, the movement-arena simulation, and
//! the `WebSocket` gateway. Loads configuration, initializes structured
//! logging, and serves until the process is terminated — per-connection
//! failures never escalate, and there is no system-wide graceful
//! shutdown beyond process exit.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `statecast-config.yaml`
//! 3. Spawn the coordinator with the arena simulation
//! 4. Build the router and bind the listener
//! 5. Serve

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use statecast_game::Game;
use statecast_server::config::AppConfig;
use statecast_server::error::ServerError;
use statecast_server::router::build_router;
use statecast_server::state::AppState;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point for the Statecast server.
///
/// # Errors
///
/// Returns an error if configuration, binding, or serving fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("statecast-server starting");

    // 2. Load configuration.
    let config = load_config()?;
    config.connection.validate().map_err(ServerError::from)?;
    info!(
        tick_rate_hz = config.hub.tick_rate_hz,
        outbound_queue_capacity = config.hub.outbound_queue_capacity,
        liveness_window_ms = config.connection.liveness_window_ms,
        "Configuration loaded"
    );

    // 3. Spawn the coordinator driving the arena simulation.
    let game = Game::new(config.game.clone());
    let (hub, _coordinator_task) = statecast_hub::spawn(game, &config.hub).map_err(ServerError::from)?;
    info!("Coordinator spawned");

    // 4. Build the router and bind.
    let state = Arc::new(AppState::new(
        hub,
        config.connection.clone(),
        config.hub.outbound_queue_capacity,
    ));
    let router = build_router(state, Path::new(&config.server.static_dir));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;
    info!(%addr, static_dir = config.server.static_dir, "statecast-server listening");

    // 5. Serve until the process is terminated.
    axum::serve(listener, router)
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    Ok(())
}

/// Load the configuration from `statecast-config.yaml`.
///
/// Looks for the config file relative to the current working directory;
/// falls back to defaults when it is absent.
fn load_config() -> Result<AppConfig, ServerError> {
    let config_path = Path::new("statecast-config.yaml");
    if config_path.exists() {
        Ok(AppConfig::from_file(config_path)?)
    } else {
        info!("Config file not found, using defaults");
        Ok(AppConfig::default())
    }
}
