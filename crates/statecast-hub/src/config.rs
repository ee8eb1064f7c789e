//! Typed configuration for the coordinator and connection endpoints.
//!
//! These structs mirror the `hub:` and `connection:` sections of
//! `statecast-config.yaml`. All fields have defaults matching the
//! constants the system was tuned with: a 30 Hz tick, a 256-message
//! outbound queue, a 10 second write deadline, a 60 second liveness
//! window, and a 512 byte inbound message cap.

use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when validating configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value is out of its accepted range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the value.
        reason: String,
    },
}

/// Coordinator settings: tick rate and channel capacities.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Broadcast cycles per second.
    pub tick_rate_hz: u32,

    /// Capacity of the shared inbound-event channel.
    pub ingress_capacity: usize,

    /// Capacity of each connection's outbound queue. When a fan-out pass
    /// finds this queue full, the connection is evicted.
    pub outbound_queue_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 30,
            ingress_capacity: 1024,
            outbound_queue_capacity: 256,
        }
    }
}

impl HubConfig {
    /// Compute the tick period from the configured rate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `tick_rate_hz` is 0.
    pub fn tick_period(&self) -> Result<Duration, ConfigError> {
        let nanos = 1_000_000_000u64
            .checked_div(u64::from(self.tick_rate_hz))
            .ok_or_else(|| ConfigError::Invalid {
                reason: "tick_rate_hz must be at least 1".to_owned(),
            })?;
        Ok(Duration::from_nanos(nanos))
    }

    /// Check that all capacities and the tick rate are non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate_hz == 0 {
            return Err(ConfigError::Invalid {
                reason: "tick_rate_hz must be at least 1".to_owned(),
            });
        }
        if self.ingress_capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: "ingress_capacity must be at least 1".to_owned(),
            });
        }
        if self.outbound_queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: "outbound_queue_capacity must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Per-connection transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Deadline for a single outbound write, in milliseconds. A peer that
    /// stalls the write path longer than this is disconnected.
    pub write_wait_ms: u64,

    /// Window within which the peer must produce some traffic (a pong at
    /// minimum), in milliseconds. Expiry closes the connection.
    pub liveness_window_ms: u64,

    /// Maximum accepted inbound message size in bytes. Larger messages
    /// close the connection.
    pub max_message_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            write_wait_ms: 10_000,
            liveness_window_ms: 60_000,
            max_message_size: 512,
        }
    }
}

impl ConnectionConfig {
    /// The write deadline as a [`Duration`].
    pub const fn write_wait(&self) -> Duration {
        Duration::from_millis(self.write_wait_ms)
    }

    /// The liveness window as a [`Duration`].
    pub const fn liveness_window(&self) -> Duration {
        Duration::from_millis(self.liveness_window_ms)
    }

    /// The interval between liveness probes (pings).
    ///
    /// Derived as nine tenths of the liveness window so a probe always
    /// fits inside the window it is meant to refresh.
    pub const fn probe_period(&self) -> Duration {
        Duration::from_millis(self.liveness_window_ms.saturating_mul(9) / 10)
    }

    /// Check that all deadlines are non-zero and the probe period fits
    /// inside the liveness window.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.write_wait_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "write_wait_ms must be at least 1".to_owned(),
            });
        }
        if self.liveness_window_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "liveness_window_ms must be at least 1".to_owned(),
            });
        }
        if self.max_message_size == 0 {
            return Err(ConfigError::Invalid {
                reason: "max_message_size must be at least 1".to_owned(),
            });
        }
        if self.probe_period() >= self.liveness_window() {
            return Err(ConfigError::Invalid {
                reason: "probe period must be shorter than the liveness window".to_owned(),
            });
        }
        Ok(())
    }
}
