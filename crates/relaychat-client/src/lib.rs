//! Client
//!
//! Sans-IO session state machine for the relaychat client. Manages the
//! connection/membership lifecycle, the append-only message log, and
//! per-send acknowledgment correlation.
//!
//! # Architecture
//!
//! The session follows an event-in / action-out pattern: callers feed
//! [`SessionEvent`]s (transport notices, inbound wire events) and invoke
//! operations ([`Session::request_join`], [`Session::send_message`],
//! [`Session::leave`]); the session returns [`SessionAction`]s (envelopes
//! to put on the wire) and never performs I/O itself. All state mutation
//! is serialized through the single caller; no locking is required.
//!
//! # Components
//!
//! - [`Session`]: connection × membership state machine owning all mutable
//!   session state
//! - [`MessageLog`]: ordered, append-only store of sent and delivered
//!   messages
//! - [`AckCoordinator`]: correlates sends with server acknowledgments
//! - [`Dispatcher`]: event-name subscription registry with scoped
//!   [`Subscription`] guards
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::Channel`]: websocket channel to the relay with automatic
//!   reconnection
//! - [`transport::spawn`]: start the channel task

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod ack;
mod dispatch;
mod error;
mod log;
mod session;

#[cfg(feature = "transport")]
pub mod transport;

pub use ack::{AckCoordinator, AckToken};
pub use dispatch::{Dispatcher, Subscription};
pub use error::SessionError;
pub use log::{ChatMessage, Delivery, MessageId, MessageLog, Origin};
pub use relaychat_proto::{Envelope, WireEvent};
pub use session::{
    ConnectionStatus, Membership, Session, SessionAction, SessionConfig, SessionEvent,
};
