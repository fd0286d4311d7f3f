//! Intent handling and snapshot production.

use relaychat_client::{Session, SessionAction, SessionConfig, SessionEvent};

use crate::view::{MessageView, SessionView};

/// Presentation-side wrapper around a [`Session`].
///
/// User intents (enter a room, send a message) become session operations;
/// local validation failures become a transient status line instead of
/// surfacing as errors. The caller mistake is user-visible, never fatal,
/// and never retried.
#[derive(Debug, Default)]
pub struct Frontend {
    session: Session,
    status: Option<String>,
}

impl Frontend {
    /// Create a frontend over a fresh session.
    pub fn new(config: SessionConfig) -> Self {
        Self { session: Session::new(config), status: None }
    }

    /// Intent: join `room` as `user`.
    ///
    /// Returns the actions to execute; on a validation failure the status
    /// line is set and no actions are produced.
    pub fn enter_room(&mut self, user: &str, room: &str) -> Vec<SessionAction> {
        match self.session.request_join(user, room) {
            Ok(actions) => {
                self.status = None;
                actions
            },
            Err(error) => {
                self.status = Some(error.to_string());
                vec![]
            },
        }
    }

    /// Intent: send `body` to the current room.
    pub fn send_message(&mut self, body: &str) -> Vec<SessionAction> {
        match self.session.send_message(body) {
            Ok(actions) => {
                self.status = None;
                actions
            },
            Err(error) => {
                self.status = Some(error.to_string());
                vec![]
            },
        }
    }

    /// Intent: leave the current room.
    pub fn leave_room(&mut self) {
        self.session.leave();
    }

    /// Feed a transport event through to the session.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        if matches!(event, SessionEvent::ConnectionDown) {
            // Membership does not survive the disconnect; tell the user.
            self.status = Some("disconnected; enter the room again once reconnected".into());
        }
        self.session.handle(event)
    }

    /// Snapshot the session for rendering.
    pub fn snapshot(&self) -> SessionView {
        SessionView {
            connection: self.session.connection_status(),
            current_user: self.session.current_user().map(str::to_owned),
            current_room: self.session.current_room().map(str::to_owned),
            messages: self
                .session
                .visible_messages()
                .map(|m| MessageView {
                    author: m.author.clone(),
                    body: m.body.clone(),
                    delivery: m.delivery,
                })
                .collect(),
            status: self.status.clone(),
        }
    }

    /// Transient status line. `None` if nothing to show.
    pub fn status_message(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// The underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }
}
