//! The connection registry and the coordinator's handle to one connection.
//!
//! The [`Registry`] is the single source of truth for "who receives the
//! next snapshot". It is owned and mutated exclusively by the coordinator
//! actor; endpoints never touch it directly. Each entry is a
//! [`ConnectionHandle`] — the sending side of that connection's bounded
//! outbound queue. The write task of the endpoint owns the receiving
//! side; dropping the handle closes the queue, which the write task
//! observes as end-of-stream. A closed queue is terminal: no further
//! enqueue can succeed.

use std::collections::HashMap;

use statecast_types::PeerId;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Result of a non-blocking enqueue onto a connection's outbound queue.
#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    /// The queue is at capacity. The coordinator treats this as the
    /// signal to evict the connection.
    #[error("outbound queue is full")]
    Full,

    /// The queue was closed; the connection is already tearing down.
    #[error("outbound queue is closed")]
    Closed,
}

/// Errors from registry mutation.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The peer is already registered. A connection may be registered at
    /// most once.
    #[error("peer {0} is already registered")]
    Duplicate(PeerId),
}

/// The coordinator's reference to one live connection.
///
/// Holds the peer identity and the bounded outbound queue sender. The
/// handle never performs I/O; the endpoint's write task drains the
/// queue onto the socket.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: PeerId,
    outbound: mpsc::Sender<String>,
}

impl ConnectionHandle {
    /// Pair a peer identity with the sending side of its outbound queue.
    pub const fn new(id: PeerId, outbound: mpsc::Sender<String>) -> Self {
        Self { id, outbound }
    }

    /// The peer this handle targets.
    pub const fn id(&self) -> PeerId {
        self.id
    }

    /// Enqueue a serialized frame without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError::Full`] when the queue is at capacity and
    /// [`EnqueueError::Closed`] when it has been closed.
    pub fn try_enqueue(&self, frame: String) -> Result<(), EnqueueError> {
        self.outbound.try_send(frame).map_err(|error| match error {
            TrySendError::Full(_) => EnqueueError::Full,
            TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }
}

/// The set of currently-registered connections, keyed by peer identity.
#[derive(Debug, Default)]
pub struct Registry {
    connections: HashMap<PeerId, ConnectionHandle>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if the peer is already
    /// registered; the registry is left unchanged.
    pub fn insert(&mut self, handle: ConnectionHandle) -> Result<(), RegistryError> {
        let id = handle.id();
        if self.connections.contains_key(&id) {
            return Err(RegistryError::Duplicate(id));
        }
        self.connections.insert(id, handle);
        Ok(())
    }

    /// Remove a connection, returning its handle if it was registered.
    ///
    /// Dropping the returned handle closes the outbound queue.
    pub fn remove(&mut self, id: PeerId) -> Option<ConnectionHandle> {
        self.connections.remove(&id)
    }

    /// Whether the peer is currently registered.
    pub fn contains(&self, id: PeerId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Iterate over all registered connection handles.
    pub fn iter(&self) -> impl Iterator<Item = &ConnectionHandle> {
        self.connections.values()
    }
}
