//! Connection registry and tick-broadcast engine for Statecast.
//!
//! This crate is the core of the system: a single coordinator actor that
//! owns the set of live connections, ingests peer-originated events,
//! drives a fixed-rate update/broadcast cycle against an opaque
//! [`Simulation`](simulation::Simulation), and fans out serialized
//! snapshots while evicting slow or dead peers instead of stalling.
//!
//! # Modules
//!
//! - [`config`] -- Tick rate, queue capacities, and connection deadlines
//! - [`simulation`] -- The collaborator contract the coordinator drives
//! - [`registry`] -- Connection handles and the registration set
//! - [`coordinator`] -- The actor, the cycle, and the backpressure policy
//!
//! # Concurrency model
//!
//! One read task and one write task per connection (owned by the server
//! crate), one coordinator actor, one tick timer. All cross-component
//! communication is message passing over bounded queues; the registry
//! and the simulation are only ever touched from the coordinator task.

pub mod config;
pub mod coordinator;
pub mod registry;
pub mod simulation;

pub use config::{ConfigError, ConnectionConfig, HubConfig};
pub use coordinator::{HubError, HubHandle, spawn};
pub use registry::{ConnectionHandle, EnqueueError, Registry, RegistryError};
pub use simulation::{Simulation, SimulationError, StubSimulation};
