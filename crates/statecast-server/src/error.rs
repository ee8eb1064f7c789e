//! Error types for the Statecast server binary.

use crate::config::ConfigError;

/// Errors that can occur while starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration could not be loaded or parsed.
    #[error("config error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// The hub configuration failed validation.
    #[error("hub config error: {source}")]
    HubConfig {
        /// The underlying validation error.
        #[from]
        source: statecast_hub::config::ConfigError,
    },

    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}
