//! Runtime orchestration loop.
//!
//! The runtime drives the event loop, coordinating between:
//! - [`Frontend`]: intent handling and snapshots
//! - the transport channel: outgoing envelopes and inbound notices
//! - a [`Dispatcher`]: raw-event taps for anything outside the session
//!
//! All session mutation happens here, on one task, in response to either a
//! user intent or a channel notice; nothing else touches the session, so
//! no locking is involved.

use relaychat_client::{
    Dispatcher, SessionAction, SessionEvent, Subscription,
    transport::{Channel, ChannelNotice},
};
use relaychat_proto::Envelope;
use tokio::sync::mpsc;

use crate::frontend::Frontend;

/// User intents accepted by the runtime.
#[derive(Debug, Clone)]
pub enum Intent {
    /// Join `room` as `user`.
    EnterRoom {
        /// Display name to join as.
        user: String,
        /// Room to join.
        room: String,
    },

    /// Send a message to the current room.
    SendMessage {
        /// Message text.
        body: String,
    },

    /// Leave the current room. Local only; the wire has no leave event.
    LeaveRoom,

    /// Shut the runtime down.
    Quit,
}

/// Event loop wiring a [`Frontend`] to the transport channel.
pub struct Runtime {
    frontend: Frontend,
    to_server: mpsc::Sender<Envelope>,
    notices: mpsc::Receiver<ChannelNotice>,
    intents: mpsc::Receiver<Intent>,
    dispatcher: Dispatcher,
}

impl Runtime {
    /// Create a runtime over a spawned [`Channel`].
    pub fn new(frontend: Frontend, channel: Channel, intents: mpsc::Receiver<Intent>) -> Self {
        Self::with_channels(frontend, channel.to_server.clone(), channel.notices, intents)
    }

    /// Create a runtime over raw channel halves.
    ///
    /// Lets tests stand in for the relay with plain mpsc channels.
    pub fn with_channels(
        frontend: Frontend,
        to_server: mpsc::Sender<Envelope>,
        notices: mpsc::Receiver<ChannelNotice>,
        intents: mpsc::Receiver<Intent>,
    ) -> Self {
        Self { frontend, to_server, notices, intents, dispatcher: Dispatcher::new() }
    }

    /// Register a raw-event tap on inbound envelopes.
    ///
    /// Handlers run before the session sees the envelope, in registration
    /// order, and stay registered until the guard is dropped.
    pub fn subscribe(
        &self,
        event: impl Into<String>,
        handler: impl FnMut(&Envelope) + Send + 'static,
    ) -> Subscription {
        self.dispatcher.subscribe(event, handler)
    }

    /// Run until a [`Intent::Quit`] arrives or both inputs close.
    ///
    /// Returns the frontend so callers can inspect the final state.
    pub async fn run(mut self) -> Frontend {
        loop {
            tokio::select! {
                // Inbound events drain before new intents are taken up, so
                // an already-delivered acknowledgment is never overtaken.
                biased;

                notice = self.notices.recv() => match notice {
                    Some(notice) => {
                        let actions = self.apply_notice(notice);
                        self.forward(actions).await;
                    },
                    None => {
                        tracing::info!("channel task gone, shutting down");
                        break;
                    },
                },
                intent = self.intents.recv() => match intent {
                    Some(Intent::Quit) | None => break,
                    Some(intent) => {
                        let actions = self.apply_intent(intent);
                        self.forward(actions).await;
                    },
                },
            }
        }

        self.frontend
    }

    fn apply_intent(&mut self, intent: Intent) -> Vec<SessionAction> {
        match intent {
            Intent::EnterRoom { user, room } => self.frontend.enter_room(&user, &room),
            Intent::SendMessage { body } => self.frontend.send_message(&body),
            Intent::LeaveRoom => {
                self.frontend.leave_room();
                vec![]
            },
            Intent::Quit => vec![],
        }
    }

    fn apply_notice(&mut self, notice: ChannelNotice) -> Vec<SessionAction> {
        let event = match notice {
            ChannelNotice::Connecting => SessionEvent::Connecting,
            ChannelNotice::Up => SessionEvent::ConnectionUp,
            ChannelNotice::Down => SessionEvent::ConnectionDown,
            ChannelNotice::Event(envelope) => {
                self.dispatcher.dispatch(&envelope);
                SessionEvent::EventReceived(envelope)
            },
        };
        self.frontend.handle(event)
    }

    async fn forward(&mut self, actions: Vec<SessionAction>) {
        for action in actions {
            match action {
                SessionAction::Send(envelope) => {
                    if self.to_server.send(envelope).await.is_err() {
                        tracing::warn!("channel task gone, envelope dropped");
                    }
                },
            }
        }
    }
}
