//! Acknowledgment correlation.
//!
//! Each acknowledged send is matched 1:1 with its own token: concurrent
//! identical-looking sends remain independently tracked, and a token
//! resolves at most once even if the server misbehaves and acks twice.

use std::collections::HashMap;

use relaychat_proto::AckId;

use crate::log::MessageId;

/// Token handed out per acknowledged send.
///
/// Rides the wire as the envelope's [`AckId`]; locally it maps back to the
/// pending log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AckToken(pub(crate) AckId);

impl AckToken {
    /// Wire-level correlation id for this token.
    pub fn id(self) -> AckId {
        self.0
    }
}

/// Correlates outgoing sends with server acknowledgments.
#[derive(Debug, Default)]
pub struct AckCoordinator {
    next: u64,
    in_flight: HashMap<AckId, MessageId>,
}

impl AckCoordinator {
    /// Create a coordinator with no sends in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending message and allocate its token.
    ///
    /// Tokens are never reused within a session's lifetime.
    pub fn register(&mut self, message: MessageId) -> AckToken {
        let id = AckId(self.next);
        self.next += 1;
        self.in_flight.insert(id, message);
        AckToken(id)
    }

    /// Resolve an inbound acknowledgment to its message.
    ///
    /// Consumes the correlation: a second ack for the same id returns
    /// `None`, as does an ack for an id this session never issued.
    pub fn resolve(&mut self, id: AckId) -> Option<MessageId> {
        self.in_flight.remove(&id)
    }

    /// Drop every in-flight correlation, returning how many there were.
    ///
    /// Used on connection loss: the relay cannot acknowledge over a
    /// connection it no longer has, so these correlations can never
    /// resolve and would otherwise accumulate for the session lifetime.
    pub fn abandon_all(&mut self) -> usize {
        let abandoned = self.in_flight.len();
        self.in_flight.clear();
        abandoned
    }

    /// Number of sends awaiting acknowledgment.
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }
}
