//! Type-safe identifier for connected peers.
//!
//! Every connection is assigned a [`PeerId`] at registration time. The ID
//! doubles as the participant identity inside the simulation, so the
//! coordinator, the endpoints, and the simulation all speak the same
//! opaque handle. IDs use UUID v4 (random) — they are assigned per
//! session and never persisted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a connected peer.
///
/// Assigned once when the transport handshake completes, announced to the
/// peer in the `playerId` envelope, and used as the participant identity
/// for the lifetime of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId(pub Uuid);

impl PeerId {
    /// Create a new random identifier (UUID v4).
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for PeerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PeerId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<PeerId> for Uuid {
    fn from(id: PeerId) -> Self {
        id.0
    }
}
