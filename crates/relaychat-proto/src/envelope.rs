//! Frame envelope and JSON codec.

use serde::{Deserialize, Serialize};

use crate::{error::WireError, event::WireEvent};

/// Transport-level acknowledgment correlation id.
///
/// Allocated by the client per acknowledged send, echoed back by the server
/// in the matching `ack` event. It identifies a single send *call*, not a
/// message: two identical-looking sends carry distinct ids and are tracked
/// independently. Ids are never reused within a connection's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AckId(pub u64);

impl std::fmt::Display for AckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One wire frame: a named event plus an optional ack correlation id.
///
/// Serialized as `{"event": <name>, "data": <payload>, "ack": <id>}` with
/// the `ack` field omitted for fire-and-forget events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// The named event and its payload.
    #[serde(flatten)]
    pub event: WireEvent,

    /// Ack correlation id. `None` for events that expect no acknowledgment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ack: Option<AckId>,
}

impl Envelope {
    /// Wrap an event with no acknowledgment expected.
    pub fn fire_and_forget(event: WireEvent) -> Self {
        Self { event, ack: None }
    }

    /// Wrap an event whose result will be correlated through `ack`.
    pub fn acknowledged(event: WireEvent, ack: AckId) -> Self {
        Self { event, ack: Some(ack) }
    }

    /// Encode to a JSON text frame.
    pub fn encode(&self) -> Result<String, WireError> {
        serde_json::to_string(self).map_err(WireError::Encode)
    }

    /// Decode from a JSON text frame.
    pub fn decode(text: &str) -> Result<Self, WireError> {
        serde_json::from_str(text).map_err(WireError::Decode)
    }
}
