//! Configuration loading for the Statecast server binary.
//!
//! The canonical configuration lives in `statecast-config.yaml` at the
//! project root. This module defines the top-level typed structure that
//! mirrors the YAML and provides a loader; the `hub:`, `connection:`,
//! and `game:` sections deserialize into the types owned by their
//! respective crates.

use std::path::Path;

use serde::Deserialize;
use statecast_game::GameConfig;
use statecast_hub::config::{ConnectionConfig, HubConfig};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Network and asset settings for the gateway itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,

    /// The TCP port to listen on.
    pub port: u16,

    /// Directory of built client assets served at the root path.
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
            static_dir: String::from("client/dist"),
        }
    }
}

/// Top-level configuration, mirroring `statecast-config.yaml`.
///
/// Every section has defaults, so a missing file or an empty document
/// yields a runnable configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Gateway network settings.
    pub server: ServerConfig,

    /// Coordinator settings (tick rate, queue capacities).
    pub hub: HubConfig,

    /// Per-connection transport deadlines.
    pub connection: ConnectionConfig,

    /// Arena dimensions and movement step.
    pub game: GameConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yml::from_str(&contents)?)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::parse("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.hub.tick_rate_hz, 30);
        assert_eq!(config.connection.max_message_size, 512);
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let yaml = "
server:
  port: 9999
hub:
  tick_rate_hz: 60
";
        let config = AppConfig::parse(yaml).unwrap();
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.hub.tick_rate_hz, 60);
        assert_eq!(config.hub.outbound_queue_capacity, 256);
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        assert!(AppConfig::parse("server: [not a map").is_err());
    }
}
