//! Session state machine.
//!
//! The `Session` is the top-level state machine that tracks connection
//! status and room membership and orchestrates message sending with
//! acknowledgment correlation. It is pure: callers execute the returned
//! [`SessionAction`]s (putting envelopes on the wire) and feed transport
//! notices back in as [`SessionEvent`]s.
//!
//! Connection and membership are orthogonal, with one coupling: losing the
//! connection forces membership back to [`Membership::NotJoined`]. Rejoin
//! after a reconnect is never automatic; the caller must request it again
//! (matching the upstream relay contract, which does not persist membership
//! across reconnects either).

use relaychat_proto::{Ack, Envelope, JoinRoom, ReceiveMsg, SendMsg, WireEvent};

use crate::{
    ack::AckCoordinator,
    error::SessionError,
    log::{ChatMessage, Delivery, MessageLog},
};

/// Connection status as reported by the transport channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// Not connected to the relay.
    #[default]
    Disconnected,
    /// Connection attempt in progress.
    Connecting,
    /// Connected to the relay.
    Connected,
}

/// Room membership.
///
/// The joined user and room names live inside the variant, so a `Joined`
/// membership always carries them; there is no separate nullable state to
/// keep in sync.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Membership {
    /// Not associated with any room.
    #[default]
    NotJoined,
    /// Join request issued, transition to `Joined` imminent.
    ///
    /// The wire defines no join acknowledgment, so this state is transient:
    /// the session moves straight through it to `Joined` optimistically.
    Joining,
    /// Associated with a room.
    ///
    /// Client-local belief, not authoritatively verified by the server.
    Joined {
        /// Display name used for this membership.
        user: String,
        /// Room name. Rooms are identified purely by name.
        room: String,
    },
}

/// Session policy knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionConfig {
    /// Show locally-sent messages before the server acknowledges them.
    ///
    /// Off by default: a message becomes visible only once acknowledged
    /// (or failed, so the user can resend).
    pub optimistic_display: bool,
}

/// Events the caller feeds into the session.
///
/// The caller is responsible for:
/// - Receiving envelopes from the transport and forwarding them here
/// - Reporting connection lifecycle changes
/// - Forwarding user intents via the operation methods
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A connection attempt started.
    Connecting,

    /// The transport is connected. Level-triggered: re-delivery of an
    /// already-known `Up` state is harmless.
    ConnectionUp,

    /// The transport lost its connection. Membership is dropped; pending
    /// acknowledgments will never resolve.
    ConnectionDown,

    /// An envelope arrived from the relay.
    EventReceived(Envelope),
}

/// Actions the session produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Put an envelope on the wire.
    Send(Envelope),
}

/// Client session: connection status, room membership, message log.
///
/// Exactly one per logical client. Constructed explicitly and passed by
/// reference; there is no global connection singleton, so independent
/// sessions can coexist in one process (and in tests).
#[derive(Debug, Default)]
pub struct Session {
    connection: ConnectionStatus,
    membership: Membership,
    log: MessageLog,
    acks: AckCoordinator,
    config: SessionConfig,
}

impl Session {
    /// Create a disconnected, not-joined session.
    pub fn new(config: SessionConfig) -> Self {
        Self { config, ..Self::default() }
    }

    /// Request to join `room` as `user`.
    ///
    /// Both names are trimmed; an empty result fails with
    /// [`SessionError::InvalidInput`] and leaves membership unchanged.
    /// Otherwise the session emits `join_room` and transitions to
    /// [`Membership::Joined`] optimistically, since the wire defines no
    /// join acknowledgment. Joining a new room implicitly replaces any prior
    /// membership; the wire defines no leave event either.
    pub fn request_join(
        &mut self,
        user: &str,
        room: &str,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let user = user.trim();
        let room = room.trim();
        if user.is_empty() {
            return Err(SessionError::InvalidInput { field: "user" });
        }
        if room.is_empty() {
            return Err(SessionError::InvalidInput { field: "room" });
        }

        self.membership = Membership::Joining;
        let envelope = Envelope::fire_and_forget(WireEvent::JoinRoom(JoinRoom {
            user: user.to_owned(),
            room: room.to_owned(),
        }));

        self.membership = Membership::Joined { user: user.to_owned(), room: room.to_owned() };
        tracing::info!(user, room, "joined room");

        Ok(vec![SessionAction::Send(envelope)])
    }

    /// Leave the current room.
    ///
    /// Purely local: the wire defines no `leave_room` event, so the server
    /// is not notified (known protocol gap; the server may or may not track
    /// membership authoritatively). The message log is retained.
    pub fn leave(&mut self) {
        if self.membership != Membership::NotJoined {
            tracing::info!("left room");
        }
        self.membership = Membership::NotJoined;
    }

    /// Send `body` to the current room.
    ///
    /// Fails with [`SessionError::NotJoined`] without a membership and
    /// [`SessionError::EmptyMessage`] for a whitespace-only body; neither
    /// touches the log. Otherwise the message is appended in
    /// [`Delivery::Pending`] state and a `send_msg` envelope carrying an
    /// ack token is emitted. The call never blocks: the outcome arrives
    /// later as a delivery transition on the appended message.
    pub fn send_message(&mut self, body: &str) -> Result<Vec<SessionAction>, SessionError> {
        let Membership::Joined { user, room } = &self.membership else {
            return Err(SessionError::NotJoined);
        };
        if body.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let event = WireEvent::SendMsg(SendMsg {
            room: room.clone(),
            user: user.clone(),
            message: body.to_owned(),
        });

        let id = self.log.push_local(user.clone(), body);
        let token = self.acks.register(id);

        Ok(vec![SessionAction::Send(Envelope::acknowledged(event, token.id()))])
    }

    /// Process a transport event and return actions.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        match event {
            SessionEvent::Connecting => {
                self.connection = ConnectionStatus::Connecting;
                vec![]
            },
            SessionEvent::ConnectionUp => {
                self.connection = ConnectionStatus::Connected;
                tracing::info!("connected to relay");
                vec![]
            },
            SessionEvent::ConnectionDown => self.handle_disconnect(),
            SessionEvent::EventReceived(envelope) => self.handle_envelope(envelope),
        }
    }

    fn handle_disconnect(&mut self) -> Vec<SessionAction> {
        self.connection = ConnectionStatus::Disconnected;
        if self.membership != Membership::NotJoined {
            // Membership does not survive a disconnect; rejoin is explicit.
            tracing::info!("disconnected, membership dropped");
            self.membership = Membership::NotJoined;
        } else {
            tracing::info!("disconnected");
        }

        // The relay cannot acknowledge over a connection it no longer has;
        // the affected messages stay pending.
        let abandoned = self.acks.abandon_all();
        if abandoned > 0 {
            tracing::debug!(abandoned, "in-flight acknowledgments abandoned");
        }
        vec![]
    }

    fn handle_envelope(&mut self, envelope: Envelope) -> Vec<SessionAction> {
        match envelope.event {
            WireEvent::ReceiveMsg(message) => self.handle_receive_msg(message),
            WireEvent::Ack(ack) => self.handle_ack(ack),
            WireEvent::JoinRoom(_) | WireEvent::SendMsg(_) => {
                tracing::debug!(event = envelope.event.name(), "dropped client-bound event");
                vec![]
            },
        }
    }

    fn handle_receive_msg(&mut self, message: ReceiveMsg) -> Vec<SessionAction> {
        // Unconditional: the wire has no leave event, so the server keeps
        // fanning out room traffic after a local leave. Those deliveries
        // are part of the log like any other.
        self.log.push_remote(message.user, message.message);
        vec![]
    }

    fn handle_ack(&mut self, ack: Ack) -> Vec<SessionAction> {
        let Some(id) = self.acks.resolve(ack.id) else {
            tracing::debug!(ack = %ack.id, "dropped duplicate or unknown ack");
            return vec![];
        };

        match ack.error {
            None => {
                self.log.resolve(id, Delivery::Acknowledged);
            },
            Some(reason) => {
                tracing::warn!(%reason, "message delivery failed");
                self.log.resolve(id, Delivery::Failed);
            },
        }
        vec![]
    }

    /// Current connection status.
    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection
    }

    /// Current room membership.
    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    /// Display name of the current membership. `None` unless joined.
    pub fn current_user(&self) -> Option<&str> {
        match &self.membership {
            Membership::Joined { user, .. } => Some(user),
            _ => None,
        }
    }

    /// Room name of the current membership. `None` unless joined.
    pub fn current_room(&self) -> Option<&str> {
        match &self.membership {
            Membership::Joined { room, .. } => Some(room),
            _ => None,
        }
    }

    /// The full message log, insertion-ordered, including pending entries.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Messages visible under the session's display policy.
    pub fn visible_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.log.visible(self.config.optimistic_display)
    }

    /// Session policy configuration.
    pub fn config(&self) -> SessionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use relaychat_proto::AckId;

    use super::*;
    use crate::log::Origin;

    fn joined_session() -> Session {
        let mut session = Session::new(SessionConfig::default());
        session.handle(SessionEvent::ConnectionUp);
        session.request_join("Alice", "general").unwrap();
        session
    }

    /// Ack id carried by the single Send action of a `send_message` call.
    fn sent_ack_id(actions: &[SessionAction]) -> AckId {
        match actions {
            [SessionAction::Send(envelope)] => envelope.ack.unwrap(),
            other => panic!("expected one Send action, got {other:?}"),
        }
    }

    #[test]
    fn join_trims_and_stores_names() {
        let mut session = Session::new(SessionConfig::default());
        session.request_join("  Alice ", " general  ").unwrap();

        assert_eq!(session.current_user(), Some("Alice"));
        assert_eq!(session.current_room(), Some("general"));
    }

    #[test]
    fn join_emits_join_room_event() {
        let mut session = Session::new(SessionConfig::default());
        let actions = session.request_join("Alice", "general").unwrap();

        assert_eq!(
            actions,
            vec![SessionAction::Send(Envelope::fire_and_forget(WireEvent::JoinRoom(JoinRoom {
                user: "Alice".into(),
                room: "general".into(),
            })))]
        );
    }

    #[test]
    fn empty_join_inputs_are_rejected() {
        let mut session = Session::new(SessionConfig::default());

        for (user, room, field) in
            [("", "room", "user"), ("user", "", "room"), ("", "", "user"), ("   ", "room", "user")]
        {
            let err = session.request_join(user, room).unwrap_err();
            assert_eq!(err, SessionError::InvalidInput { field });
            assert_eq!(*session.membership(), Membership::NotJoined);
        }
    }

    #[test]
    fn joining_again_replaces_membership() {
        let mut session = joined_session();
        session.request_join("Alice", "random").unwrap();

        assert_eq!(session.current_room(), Some("random"));
    }

    #[test]
    fn send_requires_membership() {
        let mut session = Session::new(SessionConfig::default());
        session.handle(SessionEvent::ConnectionUp);

        assert_eq!(session.send_message("hi"), Err(SessionError::NotJoined));
        assert!(session.log().is_empty());
    }

    #[test]
    fn whitespace_only_body_is_rejected() {
        let mut session = joined_session();

        assert_eq!(session.send_message("   "), Err(SessionError::EmptyMessage));
        assert!(session.log().is_empty());
    }

    #[test]
    fn send_appends_pending_and_emits_envelope() {
        let mut session = joined_session();
        let actions = session.send_message("hi").unwrap();

        let message = session.log().iter().next().unwrap();
        assert_eq!(message.author, "Alice");
        assert_eq!(message.body, "hi");
        assert_eq!(message.origin, Origin::Local);
        assert_eq!(message.delivery, Delivery::Pending);

        match &actions[..] {
            [SessionAction::Send(envelope)] => {
                assert!(envelope.ack.is_some());
                assert_eq!(
                    envelope.event,
                    WireEvent::SendMsg(SendMsg {
                        room: "general".into(),
                        user: "Alice".into(),
                        message: "hi".into(),
                    })
                );
            },
            other => panic!("expected one Send action, got {other:?}"),
        }
    }

    #[test]
    fn successful_ack_acknowledges_exactly_one_message() {
        let mut session = joined_session();
        let id = sent_ack_id(&session.send_message("hi").unwrap());

        session.handle(SessionEvent::EventReceived(Envelope::fire_and_forget(WireEvent::Ack(
            Ack { id, error: None },
        ))));

        let acked: Vec<_> =
            session.log().iter().filter(|m| m.delivery == Delivery::Acknowledged).collect();
        assert_eq!(acked.len(), 1);
        assert_eq!(acked[0].origin, Origin::Local);
    }

    #[test]
    fn failed_ack_marks_message_failed_without_retry() {
        let mut session = joined_session();
        let id = sent_ack_id(&session.send_message("hi").unwrap());

        let actions = session.handle(SessionEvent::EventReceived(Envelope::fire_and_forget(
            WireEvent::Ack(Ack { id, error: Some("room gone".into()) }),
        )));

        // No automatic resend.
        assert!(actions.is_empty());
        let failed: Vec<_> =
            session.log().iter().filter(|m| m.delivery == Delivery::Failed).collect();
        assert_eq!(failed.len(), 1);
    }

    #[test]
    fn duplicate_ack_is_not_double_applied() {
        let mut session = joined_session();
        let id = sent_ack_id(&session.send_message("hi").unwrap());

        let ack = Envelope::fire_and_forget(WireEvent::Ack(Ack { id, error: None }));
        session.handle(SessionEvent::EventReceived(ack.clone()));
        // A second, contradictory ack must not flip the state.
        session.handle(SessionEvent::EventReceived(Envelope::fire_and_forget(WireEvent::Ack(
            Ack { id, error: Some("late failure".into()) },
        ))));

        let message = session.log().iter().next().unwrap();
        assert_eq!(message.delivery, Delivery::Acknowledged);
    }

    #[test]
    fn log_order_is_send_order_regardless_of_ack_order() {
        let mut session = joined_session();
        let first = sent_ack_id(&session.send_message("first").unwrap());
        let second = sent_ack_id(&session.send_message("second").unwrap());

        // Acks arrive in reverse order.
        session.handle(SessionEvent::EventReceived(Envelope::fire_and_forget(WireEvent::Ack(
            Ack { id: second, error: None },
        ))));
        session.handle(SessionEvent::EventReceived(Envelope::fire_and_forget(WireEvent::Ack(
            Ack { id: first, error: None },
        ))));

        let bodies: Vec<_> = session.log().iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second"]);
        // Visible order matches log order once both are acknowledged.
        let visible: Vec<_> = session.visible_messages().map(|m| m.body.as_str()).collect();
        assert_eq!(visible, vec!["first", "second"]);
    }

    #[test]
    fn visibility_is_gated_by_acknowledgment() {
        let mut session = joined_session();
        let first = sent_ack_id(&session.send_message("first").unwrap());
        session.send_message("second").unwrap();

        // Only the first send is acknowledged; the second stays hidden.
        session.handle(SessionEvent::EventReceived(Envelope::fire_and_forget(WireEvent::Ack(
            Ack { id: first, error: None },
        ))));

        let visible: Vec<_> = session.visible_messages().map(|m| m.body.as_str()).collect();
        assert_eq!(visible, vec!["first"]);
    }

    #[test]
    fn optimistic_display_shows_pending_sends() {
        let mut session = Session::new(SessionConfig { optimistic_display: true });
        session.handle(SessionEvent::ConnectionUp);
        session.request_join("Alice", "general").unwrap();
        session.send_message("hi").unwrap();

        let visible: Vec<_> = session.visible_messages().map(|m| m.body.as_str()).collect();
        assert_eq!(visible, vec!["hi"]);
    }

    #[test]
    fn inbound_message_appends_remote_acknowledged() {
        let mut session = joined_session();

        session.handle(SessionEvent::EventReceived(Envelope::fire_and_forget(
            WireEvent::ReceiveMsg(ReceiveMsg { user: "Bob".into(), message: "yo".into() }),
        )));

        let message = session.log().iter().next().unwrap();
        assert_eq!(message.author, "Bob");
        assert_eq!(message.body, "yo");
        assert_eq!(message.origin, Origin::Remote);
        assert_eq!(message.delivery, Delivery::Acknowledged);
    }

    #[test]
    fn inbound_messages_append_regardless_of_membership() {
        // The server keeps fanning out room traffic after a local leave
        // (there is no leave event to tell it otherwise); those
        // deliveries land in the log like any other.
        let mut session = joined_session();
        session.leave();
        session.handle(SessionEvent::EventReceived(Envelope::fire_and_forget(
            WireEvent::ReceiveMsg(ReceiveMsg { user: "Bob".into(), message: "yo".into() }),
        )));
        assert_eq!(session.log().len(), 1);

        // Same before any join at all.
        let mut fresh = Session::new(SessionConfig::default());
        fresh.handle(SessionEvent::ConnectionUp);
        fresh.handle(SessionEvent::EventReceived(Envelope::fire_and_forget(
            WireEvent::ReceiveMsg(ReceiveMsg { user: "Bob".into(), message: "yo".into() }),
        )));

        let message = fresh.log().iter().next().unwrap();
        assert_eq!(message.author, "Bob");
        assert_eq!(message.origin, Origin::Remote);
        assert_eq!(message.delivery, Delivery::Acknowledged);
    }

    #[test]
    fn disconnect_drops_membership_until_rejoin() {
        let mut session = joined_session();

        session.handle(SessionEvent::ConnectionDown);
        assert_eq!(session.connection_status(), ConnectionStatus::Disconnected);
        assert_eq!(*session.membership(), Membership::NotJoined);
        assert_eq!(session.send_message("hi"), Err(SessionError::NotJoined));

        // Reconnect alone does not restore membership.
        session.handle(SessionEvent::ConnectionUp);
        assert_eq!(session.send_message("hi"), Err(SessionError::NotJoined));

        // An explicit rejoin does.
        session.request_join("Alice", "general").unwrap();
        assert!(session.send_message("hi").is_ok());
    }

    #[test]
    fn ack_arriving_after_reconnect_is_dropped() {
        let mut session = joined_session();
        let id = sent_ack_id(&session.send_message("hi").unwrap());

        session.handle(SessionEvent::ConnectionDown);
        session.handle(SessionEvent::ConnectionUp);
        session.handle(SessionEvent::EventReceived(Envelope::fire_and_forget(WireEvent::Ack(
            Ack { id, error: None },
        ))));

        // The correlation died with the connection; the message stays
        // pending forever rather than being confirmed by a stale ack.
        let message = session.log().iter().next().unwrap();
        assert_eq!(message.delivery, Delivery::Pending);
    }

    #[test]
    fn disconnect_preserves_log() {
        let mut session = joined_session();
        session.handle(SessionEvent::EventReceived(Envelope::fire_and_forget(
            WireEvent::ReceiveMsg(ReceiveMsg { user: "Bob".into(), message: "yo".into() }),
        )));

        session.handle(SessionEvent::ConnectionDown);
        assert_eq!(session.log().len(), 1);
    }

    #[test]
    fn ack_after_leave_resolves_into_discarded_state() {
        let mut session = joined_session();
        let id = sent_ack_id(&session.send_message("hi").unwrap());
        session.leave();

        // The in-flight ack still resolves; the message just is no longer
        // part of any room the user is in.
        session.handle(SessionEvent::EventReceived(Envelope::fire_and_forget(WireEvent::Ack(
            Ack { id, error: None },
        ))));
        let message = session.log().iter().next().unwrap();
        assert_eq!(message.delivery, Delivery::Acknowledged);
        assert_eq!(*session.membership(), Membership::NotJoined);
    }

    #[test]
    fn alice_sends_hi_scenario() {
        let mut session = Session::new(SessionConfig::default());
        session.handle(SessionEvent::Connecting);
        assert_eq!(session.connection_status(), ConnectionStatus::Connecting);
        session.handle(SessionEvent::ConnectionUp);

        session.request_join("Alice", "general").unwrap();
        let id = sent_ack_id(&session.send_message("hi").unwrap());
        session.handle(SessionEvent::EventReceived(Envelope::fire_and_forget(WireEvent::Ack(
            Ack { id, error: None },
        ))));

        let messages: Vec<_> = session.log().iter().collect();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].author, "Alice");
        assert_eq!(messages[0].body, "hi");
        assert_eq!(messages[0].delivery, Delivery::Acknowledged);
    }
}
