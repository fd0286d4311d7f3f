//! Wire protocol for the relaychat relay contract.
//!
//! The relay speaks named events carried as JSON text frames, one envelope
//! per frame. This crate defines the payload records for each event, the
//! [`Envelope`] that frames them, and the JSON codec.
//!
//! The relay itself is an external collaborator: this crate specifies only
//! the contract it exposes and consumes.
//!
//! # Events
//!
//! | event         | direction       | payload                      |
//! |---------------|-----------------|------------------------------|
//! | `join_room`   | client → server | `{user, room}`               |
//! | `send_msg`    | client → server | `{room, user, message}`      |
//! | `receive_msg` | server → client | `{user, message}`            |
//! | `ack`         | server → client | `{id, error?}`               |
//!
//! `join_room` has no acknowledgment defined; `send_msg` may be answered by
//! an `ack` event correlated through the envelope's [`AckId`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod envelope;
mod error;
mod event;

pub use envelope::{AckId, Envelope};
pub use error::WireError;
pub use event::{Ack, JoinRoom, ReceiveMsg, SendMsg, WireEvent};
