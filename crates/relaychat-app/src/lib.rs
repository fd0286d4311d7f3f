//! Presentation boundary for relaychat
//!
//! Exposes the session to a rendering layer as a read-only snapshot and
//! accepts user intents, completely decoupled from how the UI is drawn.
//! Visual layout, styling, and input widgets are someone else's problem;
//! this crate ends at the snapshot/intent interface.
//!
//! # Components
//!
//! - [`Frontend`]: wraps a session, turns intents into operations, surfaces
//!   validation errors as a transient status line
//! - [`SessionView`] / [`MessageView`]: the read-only snapshot handed to a
//!   renderer
//! - [`Runtime`]: async loop wiring a [`Frontend`] to the transport channel

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod frontend;
mod runtime;
mod view;

pub use frontend::Frontend;
pub use runtime::{Intent, Runtime};
pub use view::{MessageView, SessionView};
