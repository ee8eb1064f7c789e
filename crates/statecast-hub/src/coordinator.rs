//! The coordinator actor: registry ownership and the tick-broadcast cycle.
//!
//! One task owns the [`Registry`] and the [`Simulation`] and serializes
//! every mutation of both. All other components talk to it through three
//! bounded intake channels — registration, unregistration, and inbound
//! events — plus the tick timer that drives the broadcast cycle. No
//! locks anywhere; the channels are the only shared surface.
//!
//! # The cycle
//!
//! Each tick: drain the inbound events that are already queued, apply
//! them in arrival order, snapshot the simulation, encode the `gState`
//! envelope once, and fan the identical frame out to every registered
//! connection. Every recipient of a given cycle sees the same snapshot;
//! connections registered after fan-out begins wait for the next cycle.
//!
//! # Backpressure
//!
//! Fan-out never blocks. A connection whose outbound queue is full is
//! treated as unresponsive: it is evicted in the same pass — queue
//! closed, registry entry removed, simulation notified — so the pass
//! completes in bounded time no matter how many peers are slow.
//!
//! # Overrun policy
//!
//! If a cycle's processing outlasts the tick period, the missed ticks
//! are skipped ([`MissedTickBehavior::Skip`]) and a `skipped_cycles`
//! counter is logged. Cycles never queue up silently.

use std::time::Duration;

use statecast_types::{Envelope, InboundEvent, PeerId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, HubConfig};
use crate::registry::{ConnectionHandle, EnqueueError, Registry};
use crate::simulation::Simulation;

/// Capacity of the registration and unregistration intake channels.
const CONTROL_CAPACITY: usize = 64;

/// Errors returned by [`HubHandle`] operations.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The coordinator task is no longer running.
    #[error("the coordinator is no longer running")]
    Closed,
}

/// Cloneable handle for talking to a running coordinator.
///
/// Endpoints use it to register themselves, forward inbound events, and
/// request unregistration on teardown.
#[derive(Debug, Clone)]
pub struct HubHandle {
    register_tx: mpsc::Sender<ConnectionHandle>,
    unregister_tx: mpsc::Sender<PeerId>,
    event_tx: mpsc::Sender<InboundEvent>,
}

impl HubHandle {
    /// Register a connection for snapshot fan-out.
    ///
    /// The coordinator will announce the participant to the simulation
    /// and enqueue the `playerId` envelope before the connection sees
    /// any `gState`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Closed`] if the coordinator has stopped.
    pub async fn register(&self, handle: ConnectionHandle) -> Result<(), HubError> {
        self.register_tx
            .send(handle)
            .await
            .map_err(|_error| HubError::Closed)
    }

    /// Request unregistration of a connection.
    ///
    /// Idempotent at the coordinator: a peer that was already evicted is
    /// skipped silently.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Closed`] if the coordinator has stopped.
    pub async fn unregister(&self, id: PeerId) -> Result<(), HubError> {
        self.unregister_tx
            .send(id)
            .await
            .map_err(|_error| HubError::Closed)
    }

    /// Forward one normalized inbound event to the simulation.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Closed`] if the coordinator has stopped.
    pub async fn submit_event(&self, event: InboundEvent) -> Result<(), HubError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_error| HubError::Closed)
    }
}

/// Start the coordinator on a background task.
///
/// Returns the [`HubHandle`] for endpoints plus the task's
/// [`JoinHandle`]. The coordinator runs until the process terminates;
/// there is no system-wide graceful-shutdown protocol.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if the hub configuration fails
/// validation.
pub fn spawn<S: Simulation>(
    sim: S,
    config: &HubConfig,
) -> Result<(HubHandle, JoinHandle<()>), ConfigError> {
    config.validate()?;
    let tick_period = config.tick_period()?;

    let (register_tx, register_rx) = mpsc::channel(CONTROL_CAPACITY);
    let (unregister_tx, unregister_rx) = mpsc::channel(CONTROL_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel(config.ingress_capacity);

    let coordinator = Coordinator {
        registry: Registry::new(),
        sim,
        register_rx,
        unregister_rx,
        event_rx,
        tick_period,
        cycle: 0,
        skipped_cycles: 0,
    };

    let handle = HubHandle {
        register_tx,
        unregister_tx,
        event_tx,
    };
    let task = tokio::spawn(coordinator.run());
    Ok((handle, task))
}

/// The actor state: registry, simulation, intake channels, tick bookkeeping.
struct Coordinator<S: Simulation> {
    registry: Registry,
    sim: S,
    register_rx: mpsc::Receiver<ConnectionHandle>,
    unregister_rx: mpsc::Receiver<PeerId>,
    event_rx: mpsc::Receiver<InboundEvent>,
    tick_period: Duration,
    cycle: u64,
    skipped_cycles: u64,
}

impl<S: Simulation> Coordinator<S> {
    /// The select loop. Runs until the process terminates.
    async fn run(mut self) {
        let mut ticker = interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            tick_period_ms = u64::try_from(self.tick_period.as_millis()).unwrap_or(u64::MAX),
            "coordinator running"
        );

        loop {
            tokio::select! {
                Some(handle) = self.register_rx.recv() => self.handle_register(handle),
                Some(id) = self.unregister_rx.recv() => self.handle_unregister(id),
                Some(event) = self.event_rx.recv() => self.apply_event(&event),
                _ = ticker.tick() => self.run_cycle(),
            }
        }
    }

    /// Register a connection: announce the identity, insert, notify the
    /// simulation.
    ///
    /// The `playerId` envelope is enqueued before the connection becomes
    /// visible to fan-out, so it always precedes the first `gState`.
    fn handle_register(&mut self, handle: ConnectionHandle) {
        let id = handle.id();
        if self.registry.contains(id) {
            warn!(peer = %id, "rejecting duplicate registration");
            return;
        }

        let frame = match Envelope::player_id(id).encode() {
            Ok(frame) => frame,
            Err(error) => {
                warn!(peer = %id, %error, "failed to encode identity message, dropping connection");
                return;
            }
        };
        if let Err(error) = handle.try_enqueue(frame) {
            warn!(peer = %id, %error, "could not deliver identity message, dropping connection");
            return;
        }

        if let Err(error) = self.registry.insert(handle) {
            warn!(peer = %id, %error, "registration race lost");
            return;
        }
        self.sim.add_peer(id);
        info!(peer = %id, connections = self.registry.len(), "peer registered");
    }

    /// Unregister a connection if it is still present.
    ///
    /// Eviction and endpoint teardown may both request removal; only the
    /// first takes effect, so the simulation hears about each departure
    /// exactly once.
    fn handle_unregister(&mut self, id: PeerId) {
        if self.registry.contains(id) {
            self.sim.remove_peer(id);
            // Dropping the handle closes the outbound queue; the write
            // task observes closure and sends the close frame.
            drop(self.registry.remove(id));
            info!(peer = %id, connections = self.registry.len(), "peer unregistered");
        }
    }

    /// Apply one inbound event; a malformed event is logged and dropped.
    fn apply_event(&mut self, event: &InboundEvent) {
        if let Err(error) = self.sim.apply(event) {
            warn!(peer = %event.origin, %error, "discarding inbound event");
        }
    }

    /// One full cycle: drain events, snapshot, encode once, fan out.
    fn run_cycle(&mut self) {
        let started = Instant::now();
        self.cycle = self.cycle.saturating_add(1);

        // Apply what has already arrived; anything landing after this
        // drain waits for the next cycle.
        while let Ok(event) = self.event_rx.try_recv() {
            self.apply_event(&event);
        }

        let snapshot = match self.sim.snapshot() {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(cycle = self.cycle, %error, "snapshot failed, skipping broadcast this cycle");
                return;
            }
        };
        let frame = match Envelope::game_state(snapshot).encode() {
            Ok(frame) => frame,
            Err(error) => {
                warn!(cycle = self.cycle, %error, "snapshot encoding failed, skipping broadcast this cycle");
                return;
            }
        };

        self.fan_out(&frame);

        let elapsed = started.elapsed();
        if elapsed > self.tick_period {
            self.skipped_cycles = self.skipped_cycles.saturating_add(1);
            warn!(
                cycle = self.cycle,
                elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                skipped_total = self.skipped_cycles,
                "cycle overran the tick period, missed ticks are skipped"
            );
        }
    }

    /// Deliver one encoded frame to every registered connection.
    ///
    /// Membership at the instant this starts is exactly the recipient
    /// set for the cycle. A full queue evicts its connection in the same
    /// pass rather than blocking.
    fn fan_out(&mut self, frame: &str) {
        let mut evicted = Vec::new();
        for conn in self.registry.iter() {
            match conn.try_enqueue(frame.to_owned()) {
                Ok(()) => {}
                Err(EnqueueError::Full) => {
                    warn!(peer = %conn.id(), "outbound queue saturated, evicting peer");
                    evicted.push(conn.id());
                }
                Err(EnqueueError::Closed) => {
                    debug!(peer = %conn.id(), "outbound queue closed, evicting peer");
                    evicted.push(conn.id());
                }
            }
        }
        for id in evicted {
            self.handle_unregister(id);
        }
    }
}
