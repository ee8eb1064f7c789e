//! Shared type definitions for the Statecast realtime sync engine.
//!
//! This crate is the single source of truth for the types that cross
//! component boundaries: peer identities, the wire envelope, and the
//! inbound event record. It has no runtime state of its own.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for peer identities
//! - [`envelope`] -- The `{msgType, payload}` wire codec and frame coalescing
//! - [`event`] -- The inbound event record consumed by the simulation

pub mod envelope;
pub mod event;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use envelope::{CodecError, Envelope, FRAME_DELIMITER, MessageType, coalesce, split_frame};
pub use event::InboundEvent;
pub use ids::PeerId;
