//! Shared application state for the gateway.
//!
//! [`AppState`] is what a connection endpoint needs to come to life: the
//! coordinator handle to register against, and the transport settings
//! for its read and write paths. Wrapped in [`Arc`](std::sync::Arc) and
//! injected via Axum's `State` extractor.

use statecast_hub::config::ConnectionConfig;
use statecast_hub::coordinator::HubHandle;

/// Shared state for the Axum application.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Handle to the running coordinator.
    pub hub: HubHandle,

    /// Transport deadlines and limits for each connection.
    pub connection: ConnectionConfig,

    /// Capacity of each connection's outbound queue.
    pub outbound_queue_capacity: usize,
}

impl AppState {
    /// Assemble the state handed to every connection endpoint.
    pub const fn new(
        hub: HubHandle,
        connection: ConnectionConfig,
        outbound_queue_capacity: usize,
    ) -> Self {
        Self {
            hub,
            connection,
            outbound_queue_capacity,
        }
    }
}
