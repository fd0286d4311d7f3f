//! Named event payload types.

use serde::{Deserialize, Serialize};

use crate::envelope::AckId;

/// Request to associate this connection with a room.
///
/// No acknowledgment is defined for this event; the server is trusted to
/// honor it. Joining a new room implicitly replaces any prior membership
/// for this connection (there is no `leave_room` event upstream).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoom {
    /// Display name of the joining user.
    pub user: String,

    /// Name of the room to join. Rooms are identified purely by name.
    pub room: String,
}

/// Request to broadcast a message to room members.
///
/// The server MAY answer with an [`Ack`] event addressed to the envelope's
/// ack id: an error value on failure, no error on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMsg {
    /// Room to broadcast into.
    pub room: String,

    /// Author's display name.
    pub user: String,

    /// Message text.
    pub message: String,
}

/// Notification of a message authored by another room member.
///
/// The server does not echo the sender's own messages back; that is an
/// external contract, not something enforced here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveMsg {
    /// Author's display name.
    pub user: String,

    /// Message text.
    pub message: String,
}

/// Per-send acknowledgment from the server.
///
/// At most one ack is delivered per acknowledged send. Absence of `error`
/// means the send succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Correlation id from the originating envelope.
    pub id: AckId,

    /// Error description on failure. `None` on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A named event with its payload.
///
/// The `event` tag on the wire selects the variant; the payload rides under
/// `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum WireEvent {
    /// `join_room` (client → server).
    JoinRoom(JoinRoom),

    /// `send_msg` (client → server).
    SendMsg(SendMsg),

    /// `receive_msg` (server → client).
    ReceiveMsg(ReceiveMsg),

    /// `ack` (server → client).
    Ack(Ack),
}

impl WireEvent {
    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom(_) => "join_room",
            Self::SendMsg(_) => "send_msg",
            Self::ReceiveMsg(_) => "receive_msg",
            Self::Ack(_) => "ack",
        }
    }
}
