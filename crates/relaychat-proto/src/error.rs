//! Wire protocol errors.

use thiserror::Error;

/// Errors from encoding or decoding wire frames.
///
/// Decode errors come from the network and are never fatal: the caller
/// drops the offending frame and keeps reading.
#[derive(Debug, Error)]
pub enum WireError {
    /// Frame could not be serialized to JSON.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Inbound frame was not a valid envelope.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
