//! Inbound event carried from a connection endpoint to the coordinator.

use crate::ids::PeerId;

/// One normalized inbound message from a peer, awaiting application to
/// the simulation.
///
/// Events are transient: each is consumed exactly once. The `data` field
/// holds the normalized text of a single transport frame (embedded line
/// breaks replaced by spaces, surrounding whitespace trimmed), so one
/// frame always maps to one logical line. The originating peer travels
/// with the payload because the wire text itself is opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// The peer the event originated from.
    pub origin: PeerId,

    /// The normalized message text.
    pub data: String,
}

impl InboundEvent {
    /// Create an event from an origin and already-normalized text.
    pub const fn new(origin: PeerId, data: String) -> Self {
        Self { origin, data }
    }
}
