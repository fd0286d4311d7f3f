//! Session error types.
//!
//! These are local validation failures: caller mistakes reported
//! synchronously, never retried, never fatal. Transport-level failures do
//! not surface here; they arrive as [`crate::Delivery`] transitions on the
//! affected message or as connection status changes.

use thiserror::Error;

/// Errors returned synchronously by session operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A join was requested with an empty user or room name.
    #[error("invalid input: {field} must not be empty")]
    InvalidInput {
        /// Which input was empty after trimming.
        field: &'static str,
    },

    /// A message send was requested with a whitespace-only body.
    #[error("message body is empty")]
    EmptyMessage,

    /// A message send was requested without a room membership.
    #[error("not joined to a room")]
    NotJoined,
}
