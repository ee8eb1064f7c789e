//! Statecast gateway library: router, connection endpoint, configuration.
//!
//! The binary in `main.rs` is a thin wrapper around these modules; they
//! are exposed as a library so the integration tests can stand up the
//! full stack on an ephemeral port.
//!
//! # Modules
//!
//! - [`config`] -- `statecast-config.yaml` loading
//! - [`error`] -- server error type
//! - [`state`] -- shared Axum application state
//! - [`router`] -- route assembly (`/ws` + static assets)
//! - [`ws`] -- the per-connection read/write task pair

pub mod config;
pub mod error;
pub mod router;
pub mod state;
pub mod ws;

pub use config::{AppConfig, ConfigError, ServerConfig};
pub use error::ServerError;
pub use router::build_router;
pub use state::AppState;
