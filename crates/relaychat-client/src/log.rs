//! Append-only message log.
//!
//! The log stores every delivered and locally-sent message in insertion
//! order. Entries are never removed or reordered within a session's
//! lifetime; the only mutation is the delivery-state transition of a local
//! message out of [`Delivery::Pending`]. There is no clock involved:
//! ordering is purely insertion order, and whether newest-first or
//! oldest-first is shown is a presentation concern.

/// Opaque, process-local message identity.
///
/// Assigned by the log at append time. Never exchanged with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(u64);

/// Where a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Authored by this session.
    Local,
    /// Delivered by the relay on behalf of another member.
    Remote,
}

/// Delivery state of a message.
///
/// Remote messages are born [`Delivery::Acknowledged`]. Local messages are
/// born [`Delivery::Pending`] and transition exactly once, or never if the
/// acknowledgment is lost to a disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Sent, acknowledgment outstanding.
    Pending,
    /// Confirmed delivered (or remote, which needs no confirmation).
    Acknowledged,
    /// The server reported a delivery error. Not retried automatically;
    /// the user decides whether to resend.
    Failed,
}

/// A single log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Log-assigned identity.
    pub id: MessageId,
    /// Author's display name.
    pub author: String,
    /// Message text.
    pub body: String,
    /// Local or remote origin.
    pub origin: Origin,
    /// Current delivery state.
    pub delivery: Delivery,
}

/// Ordered, append-only sequence of [`ChatMessage`].
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Vec<ChatMessage>,
    next_id: u64,
}

impl MessageLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a locally-authored message in [`Delivery::Pending`] state.
    ///
    /// Returns the assigned id for acknowledgment correlation.
    pub fn push_local(&mut self, author: impl Into<String>, body: impl Into<String>) -> MessageId {
        self.push(author.into(), body.into(), Origin::Local, Delivery::Pending)
    }

    /// Append a remote message, acknowledged immediately.
    pub fn push_remote(&mut self, author: impl Into<String>, body: impl Into<String>) -> MessageId {
        self.push(author.into(), body.into(), Origin::Remote, Delivery::Acknowledged)
    }

    fn push(&mut self, author: String, body: String, origin: Origin, delivery: Delivery) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.entries.push(ChatMessage { id, author, body, origin, delivery });
        id
    }

    /// Resolve a pending local message to its final delivery state.
    ///
    /// Idempotent: only a [`Delivery::Pending`] entry transitions, so a
    /// duplicate resolution is a no-op. Returns `true` if a transition
    /// happened.
    pub fn resolve(&mut self, id: MessageId, delivery: Delivery) -> bool {
        match self.entries.iter_mut().find(|m| m.id == id) {
            Some(message) if message.delivery == Delivery::Pending => {
                message.delivery = delivery;
                true
            },
            _ => false,
        }
    }

    /// All entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter()
    }

    /// Entries visible to a rendering layer, in insertion order.
    ///
    /// Remote and failed messages are always visible (a user must see a
    /// "failed to send" marker to decide on a resend). Pending local
    /// messages are visible only under the optimistic-display policy.
    pub fn visible(&self, optimistic: bool) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter().filter(move |m| match (m.origin, m.delivery) {
            (Origin::Remote, _) => true,
            (Origin::Local, Delivery::Pending) => optimistic,
            (Origin::Local, _) => true,
        })
    }

    /// Number of entries, visible or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by id.
    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        self.entries.iter().find(|m| m.id == id)
    }
}
