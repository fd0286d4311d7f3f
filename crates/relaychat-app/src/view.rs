//! Read-only view types for a rendering layer.
//!
//! These structures are the "view model": the subset of session state a
//! renderer needs, detached from the live session so the renderer holds no
//! borrow into it. Whether messages are drawn newest-first or oldest-first
//! is the renderer's choice; the snapshot carries them in insertion order.

use relaychat_client::{ConnectionStatus, Delivery};

/// One visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    /// Author's display name.
    pub author: String,
    /// Message text.
    pub body: String,
    /// Delivery marker. [`Delivery::Failed`] entries should be rendered
    /// distinctly so the user can decide to resend.
    pub delivery: Delivery,
}

/// Snapshot of the session for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// Current connection status.
    pub connection: ConnectionStatus,
    /// Display name of the current membership. `None` unless joined.
    pub current_user: Option<String>,
    /// Room name of the current membership. `None` unless joined.
    pub current_room: Option<String>,
    /// Visible messages in insertion order, filtered by the session's
    /// display policy.
    pub messages: Vec<MessageView>,
    /// Transient status line. `None` if nothing to show.
    pub status: Option<String>,
}
