//! The contract between the coordinator and the simulated state.
//!
//! The coordinator treats the simulation as an opaque collaborator: it
//! announces participants joining and leaving, hands over inbound events
//! one at a time, and asks for a serializable snapshot once per cycle.
//! It never inspects simulation internals beyond this trait.
//!
//! State behind a [`Simulation`] is mutated exclusively from the
//! coordinator's single actor task, so implementations need `Send` but
//! no internal synchronization.

use serde_json::Value;
use statecast_types::{InboundEvent, PeerId};

/// Errors surfaced by a simulation implementation.
///
/// All of these are non-fatal to the coordinator: a failed `apply`
/// discards that single event, a failed `snapshot` skips one cycle's
/// broadcast.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The inbound event could not be decoded.
    #[error("malformed event: {source}")]
    MalformedEvent {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The event decoded but cannot be applied (unknown action, unknown
    /// participant, and so on).
    #[error("unsupported event: {reason}")]
    Unsupported {
        /// Explanation of why the event was rejected.
        reason: String,
    },

    /// The snapshot could not be serialized.
    #[error("snapshot serialization failed: {source}")]
    Snapshot {
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

/// The simulated state updated each cycle and broadcast to every peer.
pub trait Simulation: Send + 'static {
    /// A new participant joined (called when its connection registers).
    fn add_peer(&mut self, id: PeerId);

    /// A participant left (called exactly once when its connection is
    /// unregistered or evicted).
    fn remove_peer(&mut self, id: PeerId);

    /// Decode and apply one inbound event.
    ///
    /// # Errors
    ///
    /// Returns a [`SimulationError`] if the event is malformed or cannot
    /// be applied; the coordinator logs and discards it.
    fn apply(&mut self, event: &InboundEvent) -> Result<(), SimulationError>;

    /// Produce the full serializable state for this cycle's broadcast.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Snapshot`] if serialization fails; the
    /// coordinator skips broadcasting for that cycle only.
    fn snapshot(&self) -> Result<Value, SimulationError>;
}

/// A minimal simulation for tests and wiring checks.
///
/// Tracks participant and event counts; events must be valid JSON but
/// are otherwise ignored. The snapshot only changes when a peer joins
/// or leaves or an event is applied.
#[derive(Debug, Default)]
pub struct StubSimulation {
    peers: u64,
    applied: u64,
}

impl StubSimulation {
    /// Create an empty stub.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Simulation for StubSimulation {
    fn add_peer(&mut self, _id: PeerId) {
        self.peers = self.peers.saturating_add(1);
    }

    fn remove_peer(&mut self, _id: PeerId) {
        self.peers = self.peers.saturating_sub(1);
    }

    fn apply(&mut self, event: &InboundEvent) -> Result<(), SimulationError> {
        let _: Value = serde_json::from_str(&event.data)?;
        self.applied = self.applied.saturating_add(1);
        Ok(())
    }

    fn snapshot(&self) -> Result<Value, SimulationError> {
        Ok(serde_json::json!({
            "peers": self.peers,
            "events": self.applied,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn stub_counts_peers_and_events() {
        let mut sim = StubSimulation::new();
        let a = PeerId::new();
        let b = PeerId::new();

        sim.add_peer(a);
        sim.add_peer(b);
        sim.remove_peer(a);

        let ok = InboundEvent::new(b, String::from(r#"{"action":"noop"}"#));
        sim.apply(&ok).unwrap();

        let snapshot = sim.snapshot().unwrap();
        assert_eq!(snapshot["peers"], 1);
        assert_eq!(snapshot["events"], 1);
    }

    #[test]
    fn stub_rejects_malformed_events() {
        let mut sim = StubSimulation::new();
        let bad = InboundEvent::new(PeerId::new(), String::from("{broken"));
        assert!(sim.apply(&bad).is_err());
        assert_eq!(sim.snapshot().unwrap()["events"], 0);
    }
}
