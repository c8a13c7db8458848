//! Client error types.
//!
//! One variant per failure class from the error taxonomy: connect
//! failures, sends while disconnected, and mid-session transport errors.
//! Transport errors always come paired with a forced transition back to
//! `Disconnected`; the caller reconnects with a fresh explicit `connect`.

use nulframe_proto::ProtocolError;
use thiserror::Error;

/// Errors surfaced by the connection manager and facade.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// TCP connection establishment failed.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Operation requires a connected socket.
    #[error("not connected")]
    NotConnected,

    /// Read or write failed mid-session; the connection has been torn down.
    #[error("transport error: {0}")]
    Transport(String),

    /// Outgoing envelope could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
