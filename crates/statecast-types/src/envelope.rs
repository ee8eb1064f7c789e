//! Wire envelope codec for peer-facing messages.
//!
//! Every message sent to a peer is wrapped in an [`Envelope`] of the form
//! `{"msgType": "<string>", "payload": <any>}`. Two message types exist:
//!
//! - `playerId` — delivered exactly once, immediately after a connection
//!   registers, carrying the newly assigned [`PeerId`].
//! - `gState` — delivered once per cycle to every registered connection,
//!   carrying the full serialized simulation snapshot.
//!
//! The codec is stateless. Decoding is best-effort at call sites: a
//! malformed envelope is logged and discarded by the caller, never fatal.
//!
//! # Frame coalescing
//!
//! Multiple pending outbound messages may be packed into a single
//! transport frame, separated by [`FRAME_DELIMITER`]. A receiver must
//! split on the delimiter and decode each segment independently.
//! [`coalesce`] and [`split_frame`] implement both directions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::PeerId;

/// Delimiter separating coalesced messages within one transport frame.
pub const FRAME_DELIMITER: char = '\n';

/// Errors produced by the envelope codec.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The envelope could not be serialized to JSON.
    #[error("failed to encode envelope: {source}")]
    Encode {
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// The raw text was not a valid envelope.
    #[error("failed to decode envelope: {source}")]
    Decode {
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

/// Discriminant of a wire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    /// Identity assignment, sent once right after registration.
    #[serde(rename = "playerId")]
    PlayerId,

    /// Full simulation snapshot, sent once per cycle.
    #[serde(rename = "gState")]
    GameState,
}

/// The `{msgType, payload}` wrapper around every wire message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The message discriminant.
    #[serde(rename = "msgType")]
    pub msg_type: MessageType,

    /// The message body; its shape depends on [`Envelope::msg_type`].
    pub payload: Value,
}

impl Envelope {
    /// Build the identity-assignment envelope for a freshly registered peer.
    ///
    /// The payload is `{"playerId": "<uuid>"}`.
    pub fn player_id(id: PeerId) -> Self {
        Self {
            msg_type: MessageType::PlayerId,
            payload: serde_json::json!({ "playerId": id }),
        }
    }

    /// Wrap a simulation snapshot in the `gState` envelope.
    pub const fn game_state(snapshot: Value) -> Self {
        Self {
            msg_type: MessageType::GameState,
            payload: snapshot,
        }
    }

    /// Serialize the envelope to its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if JSON serialization fails.
    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(|source| CodecError::Encode { source })
    }

    /// Parse an envelope from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] if the text is not a valid envelope.
    pub fn decode(raw: &str) -> Result<Self, CodecError> {
        serde_json::from_str(raw).map_err(|source| CodecError::Decode { source })
    }
}

/// Join pending messages into a single newline-delimited transport frame.
///
/// The first segment is not preceded by a delimiter, so a frame holding a
/// single message is byte-identical to that message.
pub fn coalesce(segments: &[String]) -> String {
    segments.join("\n")
}

/// Split a transport frame back into its coalesced segments.
///
/// A frame that was never coalesced yields exactly one segment.
pub fn split_frame(frame: &str) -> core::str::Split<'_, char> {
    frame.split(FRAME_DELIMITER)
}
