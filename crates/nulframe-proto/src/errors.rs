//! Wire-layer error types.
//!
//! Decode failures never surface here: a malformed incoming frame is a
//! peer problem, logged and dropped by the codec so the stream keeps
//! flowing. Only encode failures are reportable, and for the envelope
//! types in this crate they indicate an implementation bug.

use thiserror::Error;

/// Errors produced by the frame codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// JSON serialization of an outgoing envelope failed.
    #[error("encode failed: {0}")]
    Encode(String),
}
